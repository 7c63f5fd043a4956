//! Launcher flow: terminal setup, job construction and community steps.

use alistaire_adapter_remote::RemoteConnector;
use alistaire_adapter_sim::SimulatorConnector;
use alistaire_hal::{BackendRegistry, DispatchResult, Dispatcher};
use alistaire_ir::{JobDescription, Operation, OperationKind, SlotId};
use tracing::{debug, instrument};

use crate::error::{LauncherError, LauncherResult};
use crate::host::{FeedbackChannel, Renderer, SyncProvider};
use crate::settings::Settings;

/// Backend identifier served by the local simulator.
pub const SIMULATOR_BACKEND: &str = "simulator";

/// Apply the terminal settings through the host capabilities.
#[instrument(skip_all)]
pub fn configure_terminal(
    settings: &Settings,
    renderer: &mut dyn Renderer,
    sync: &mut dyn SyncProvider,
) -> LauncherResult<()> {
    let terminal = &settings.terminal;

    renderer.set_renderer(&terminal.renderer)?;
    renderer.set_connection_type(&terminal.connection)?;
    for binding in &terminal.caps_key {
        renderer.set_caps_key(&binding.editor, &binding.key)?;
    }
    renderer.set_fonts(&terminal.fonts)?;
    renderer.set_themes(&terminal.themes)?;
    renderer.configure_host(&settings.host.address, &settings.host.key)?;

    if terminal.split_view {
        renderer.enable_split_view()?;
    }
    if terminal.cloud_sync {
        sync.enable_sync()?;
    }
    debug!("Terminal configured");
    Ok(())
}

/// Community steps run after the session.
pub fn participate(settings: &Settings, feedback: &mut dyn FeedbackChannel) -> LauncherResult<()> {
    feedback.visit_website(&settings.community.website)?;
    feedback.join_discussion()?;
    feedback.open_feedback_form()?;
    feedback.open_feature_request_form()?;
    feedback.check_for_updates()?;
    feedback.share_app()?;
    Ok(())
}

/// Dispatcher with the local simulator registered as [`SIMULATOR_BACKEND`]
/// and every other identifier routed to the remote service.
pub fn build_dispatcher(settings: &Settings) -> LauncherResult<Dispatcher> {
    let mut registry = BackendRegistry::new();
    registry.register(SIMULATOR_BACKEND, SimulatorConnector::new());
    registry.set_fallback(RemoteConnector::new(settings.dispatch.service_url.clone()));

    let policy = settings.poll_policy()?;
    Ok(Dispatcher::new(registry).with_policy(policy))
}

/// Jobs the launcher knows how to build.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoJob {
    /// Two linked slots: `h(0); cx(0, 1)`.
    Bell,
    /// `n` linked slots: `h(0); cx(0, 1); ...; cx(n-2, n-1)`.
    Ghz(u32),
    /// Operations given on the command line, e.g. `x:1`, `cx:0,1`.
    Custom {
        slots: u32,
        operations: Vec<Operation>,
    },
}

impl DemoJob {
    pub fn slot_count(&self) -> u32 {
        match self {
            DemoJob::Bell => 2,
            DemoJob::Ghz(n) => *n,
            DemoJob::Custom { slots, .. } => *slots,
        }
    }

    /// Build the job through the dispatcher and finalize its observation.
    pub fn build(&self, dispatcher: &Dispatcher) -> DispatchResult<JobDescription> {
        let slots = self.slot_count();
        let mut job = dispatcher.build_job(slots)?;
        match self {
            DemoJob::Bell | DemoJob::Ghz(_) => {
                dispatcher.add_operation(&mut job, OperationKind::H, [SlotId(0)])?;
                for target in 1..slots {
                    dispatcher.add_operation(
                        &mut job,
                        OperationKind::CX,
                        [SlotId(target - 1), SlotId(target)],
                    )?;
                }
            }
            DemoJob::Custom { operations, .. } => {
                for op in operations {
                    dispatcher.add_operation(&mut job, op.kind, op.targets.iter().copied())?;
                }
            }
        }
        dispatcher.finalize_observation(&mut job)?;
        Ok(job.with_name(self.name()))
    }

    fn name(&self) -> String {
        match self {
            DemoJob::Bell => "bell".to_string(),
            DemoJob::Ghz(n) => format!("ghz_{n}"),
            DemoJob::Custom { .. } => "custom".to_string(),
        }
    }
}

/// Check a signed shot count from the command line.
pub fn parse_shots(shots: i64) -> LauncherResult<u32> {
    if shots <= 0 {
        return Err(LauncherError::Validation(format!(
            "shots must be positive, got {shots}"
        )));
    }
    u32::try_from(shots)
        .map_err(|_| LauncherError::Validation(format!("shots must be at most {}, got {shots}", u32::MAX)))
}
