//! Execution-manager abstraction.
//!
//! The manager owns tasks and data containers and connects them. Composition
//! code only talks to the [`AnalysisManager`] trait; [`ManagerGraph`] is the
//! in-memory implementation that records the wiring so it can be inspected
//! or dumped as JSON.

use calotrack_protocol::defaults::DEFAULT_COMMON_FILE;
use calotrack_protocol::{ContainerKind, DataKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::WiringError;

/// Name of the container holding the input events.
pub const COMMON_INPUT_CONTAINER: &str = "cAUTO_INPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ContainerId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Input event handler of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputHandler {
    /// Format of the events the handler delivers.
    pub data_kind: DataKind,
    /// Whether the magnetic field must be loaded before the first event.
    pub need_field: bool,
}

impl InputHandler {
    pub fn new(data_kind: DataKind) -> Self {
        Self {
            data_kind,
            need_field: false,
        }
    }
}

/// A task as seen by the manager.
pub trait AnalysisTask {
    fn name(&self) -> &str;

    /// Digest of the configuration the task was built from.
    fn fingerprint(&self) -> &str;

    /// Full settings snapshot for bookkeeping.
    fn settings(&self) -> serde_json::Value;
}

/// Operations the composition code needs from an execution manager.
pub trait AnalysisManager {
    fn input_handler(&self) -> Option<&InputHandler>;

    fn input_handler_mut(&mut self) -> Option<&mut InputHandler>;

    /// Whether a Monte Carlo truth handler is attached.
    fn has_mc_truth_handler(&self) -> bool;

    fn common_input_container(&self) -> ContainerId;

    /// File that outputs go to when the caller does not name one.
    fn common_file_name(&self) -> &str;

    fn add_task(&mut self, task: &dyn AnalysisTask) -> TaskId;

    fn create_output_container(&mut self, name: &str, kind: ContainerKind, file: &str)
        -> ContainerId;

    fn connect_input(
        &mut self,
        task: TaskId,
        slot: usize,
        container: ContainerId,
    ) -> Result<(), WiringError>;

    fn connect_output(
        &mut self,
        task: TaskId,
        slot: usize,
        container: ContainerId,
    ) -> Result<(), WiringError>;
}

/// One named output of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    pub slot: usize,
    pub name: String,
    pub kind: ContainerKind,
    pub file: String,
}

/// Connections a task needs: the common input plus its named outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wiring {
    pub input_slot: usize,
    pub outputs: Vec<OutputSpec>,
}

impl Wiring {
    /// Reject a wiring that connects one output slot twice.
    pub fn validate(&self, task: &str) -> Result<(), WiringError> {
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.outputs {
            if !seen.insert(spec.slot) {
                return Err(WiringError::SlotTaken {
                    task: task.to_string(),
                    slot: spec.slot,
                    direction: "output",
                });
            }
        }
        Ok(())
    }
}

/// A task accepted by the manager together with its connections.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredTask<T> {
    pub id: TaskId,
    pub task: T,
    pub input: ContainerId,
    pub outputs: Vec<ContainerId>,
}

/// Register `task` and connect it as described by `wiring`.
///
/// The wiring is validated before the task is added, so a malformed wiring
/// leaves the manager untouched. A connection the manager itself refuses
/// after that point leaves the task registered but partially wired.
pub fn wire_task<T: AnalysisTask>(
    manager: &mut dyn AnalysisManager,
    task: T,
    wiring: &Wiring,
) -> Result<RegisteredTask<T>, WiringError> {
    wiring.validate(task.name())?;
    let id = manager.add_task(&task);
    let input = manager.common_input_container();
    manager.connect_input(id, wiring.input_slot, input)?;

    let mut outputs = Vec::with_capacity(wiring.outputs.len());
    for spec in &wiring.outputs {
        let container = manager.create_output_container(&spec.name, spec.kind, &spec.file);
        manager.connect_output(id, spec.slot, container)?;
        outputs.push(container);
    }

    debug!(task = task.name(), %id, outputs = outputs.len(), "Task wired");
    Ok(RegisteredTask {
        id,
        task,
        input,
        outputs,
    })
}

// ============================================================================
// In-memory manager
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub name: String,
    pub fingerprint: String,
    pub settings: serde_json::Value,
    pub inputs: BTreeMap<usize, ContainerId>,
    pub outputs: BTreeMap<usize, ContainerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerRecord {
    pub name: String,
    pub kind: ContainerKind,
    /// `None` for the in-memory input container
    pub file: Option<String>,
    pub producers: Vec<TaskId>,
}

/// Two producers writing into one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameAlias {
    pub container: String,
    pub first: TaskId,
    pub second: TaskId,
    /// Both producers were built from identical flags
    pub identical: bool,
}

/// Records tasks, containers and connections.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerGraph {
    input_handler: Option<InputHandler>,
    mc_truth: bool,
    common_file: String,
    tasks: Vec<TaskRecord>,
    containers: Vec<ContainerRecord>,
    aliases: Vec<NameAlias>,
}

impl ManagerGraph {
    /// Manager with an input handler for `data_kind`.
    pub fn new(data_kind: DataKind) -> Self {
        Self::build(Some(InputHandler::new(data_kind)))
    }

    /// Manager that has no input event handler attached.
    pub fn without_input_handler() -> Self {
        Self::build(None)
    }

    fn build(input_handler: Option<InputHandler>) -> Self {
        Self {
            input_handler,
            mc_truth: false,
            common_file: DEFAULT_COMMON_FILE.to_string(),
            tasks: Vec::new(),
            containers: vec![ContainerRecord {
                name: COMMON_INPUT_CONTAINER.to_string(),
                kind: ContainerKind::Input,
                file: None,
                producers: Vec::new(),
            }],
            aliases: Vec::new(),
        }
    }

    pub fn with_mc_truth(mut self, mc_truth: bool) -> Self {
        self.mc_truth = mc_truth;
        self
    }

    pub fn with_common_file(mut self, file: impl Into<String>) -> Self {
        self.common_file = file.into();
        self
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(id.0)
    }

    pub fn containers(&self) -> &[ContainerRecord] {
        &self.containers
    }

    pub fn container(&self, id: ContainerId) -> Option<&ContainerRecord> {
        self.containers.get(id.0)
    }

    pub fn find_container(&self, name: &str) -> Option<ContainerId> {
        self.containers
            .iter()
            .position(|c| c.name == name)
            .map(ContainerId)
    }

    /// Containers written by more than one task.
    pub fn aliases(&self) -> &[NameAlias] {
        &self.aliases
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut TaskRecord, WiringError> {
        self.tasks
            .get_mut(id.0)
            .ok_or(WiringError::UnknownTask(id.0))
    }

    fn check_container(&self, id: ContainerId) -> Result<(), WiringError> {
        if id.0 < self.containers.len() {
            Ok(())
        } else {
            Err(WiringError::UnknownContainer(id.0))
        }
    }
}

impl AnalysisManager for ManagerGraph {
    fn input_handler(&self) -> Option<&InputHandler> {
        self.input_handler.as_ref()
    }

    fn input_handler_mut(&mut self) -> Option<&mut InputHandler> {
        self.input_handler.as_mut()
    }

    fn has_mc_truth_handler(&self) -> bool {
        self.mc_truth
    }

    fn common_input_container(&self) -> ContainerId {
        ContainerId(0)
    }

    fn common_file_name(&self) -> &str {
        &self.common_file
    }

    fn add_task(&mut self, task: &dyn AnalysisTask) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(TaskRecord {
            name: task.name().to_string(),
            fingerprint: task.fingerprint().to_string(),
            settings: task.settings(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        });
        id
    }

    fn create_output_container(
        &mut self,
        name: &str,
        kind: ContainerKind,
        file: &str,
    ) -> ContainerId {
        if let Some(existing) = self.find_container(name) {
            warn!(
                container = name,
                "Output container already exists; outputs will share it"
            );
            return existing;
        }
        let id = ContainerId(self.containers.len());
        self.containers.push(ContainerRecord {
            name: name.to_string(),
            kind,
            file: Some(file.to_string()),
            producers: Vec::new(),
        });
        id
    }

    fn connect_input(
        &mut self,
        task: TaskId,
        slot: usize,
        container: ContainerId,
    ) -> Result<(), WiringError> {
        self.check_container(container)?;
        let record = self.task_mut(task)?;
        if record.inputs.contains_key(&slot) {
            return Err(WiringError::SlotTaken {
                task: record.name.clone(),
                slot,
                direction: "input",
            });
        }
        record.inputs.insert(slot, container);
        Ok(())
    }

    fn connect_output(
        &mut self,
        task: TaskId,
        slot: usize,
        container: ContainerId,
    ) -> Result<(), WiringError> {
        self.check_container(container)?;
        let record = self.task_mut(task)?;
        if record.outputs.contains_key(&slot) {
            return Err(WiringError::SlotTaken {
                task: record.name.clone(),
                slot,
                direction: "output",
            });
        }
        record.outputs.insert(slot, container);
        let fingerprint = record.fingerprint.clone();

        let previous = self.containers[container.0].producers.first().copied();
        if let Some(first) = previous {
            let identical = self.tasks[first.0].fingerprint == fingerprint;
            let name = self.containers[container.0].name.clone();
            if identical {
                warn!(container = %name, "Identical task configuration registered twice");
            } else {
                warn!(
                    container = %name,
                    "Distinct task configurations alias the same output container"
                );
            }
            self.aliases.push(NameAlias {
                container: name,
                first,
                second: task,
                identical,
            });
        }
        self.containers[container.0].producers.push(task);
        Ok(())
    }
}
