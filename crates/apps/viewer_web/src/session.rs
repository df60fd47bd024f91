use std::cell::RefCell;

use compute::client::EvaluationClient;
use compute::config::ComputeConfig;
use compute::error::EvaluationError;
use compute::transport::Transport;
use formats::kernel::GeometryKernel;
use formats::protocol::{EvaluationResponse, Param};
use runtime::{
    RunGate, RunTicket, STATUS_DONE, STATUS_EVALUATING, STATUS_LOADING_DEFINITION, StatusBus,
    StatusLine,
};
use scene::camera::{Camera, FramingPolicy};
use scene::components::Visibility;
use scene::ingest::ingest;
use scene::visibility::{VisibilityToggle, apply_toggle, build_toggles};
use scene::{SceneObject, World};
use settings::{SettingsStore, load_compute_url, save_compute_url};
use tracing::debug;

/// Definition loaded on every run, relative to the page.
pub const DEFAULT_DEFINITION_PATH: &str = "./box.gh";

/// What a trigger needs once it leaves the session borrow.
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub ticket: RunTicket,
    pub config: ComputeConfig,
    pub definition_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The scene now shows this run's geometry.
    Applied { meshes: usize, skipped: usize },
    /// The run was rejected or failed; the status line says why.
    Failed,
    /// A newer trigger started before this one finished; nothing changed.
    Stale,
}

/// Everything the page keeps between triggers.
pub struct Session {
    settings: Box<dyn SettingsStore>,
    endpoint_url: String,
    api_key: Option<String>,
    definition_path: String,
    world: World,
    camera: Camera,
    gate: RunGate,
    status: StatusBus,
    toggles: Vec<VisibilityToggle>,
}

impl Session {
    /// Starts a session, pre-filling the endpoint from `settings`.
    pub fn new(settings: Box<dyn SettingsStore>) -> Self {
        let endpoint_url = load_compute_url(settings.as_ref()).unwrap_or_default();
        Self {
            settings,
            endpoint_url,
            api_key: None,
            definition_path: DEFAULT_DEFINITION_PATH.to_string(),
            world: World::new(),
            camera: Camera::evaluation_viewer(),
            gate: RunGate::new(),
            status: StatusBus::new(),
            toggles: Vec::new(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn set_endpoint_url(&mut self, url: &str) {
        self.endpoint_url = url.to_string();
    }

    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    pub fn definition_path(&self) -> &str {
        &self.definition_path
    }

    pub fn set_definition_path(&mut self, path: &str) {
        self.definition_path = path.to_string();
    }

    /// Validates the endpoint, remembers it and hands out a ticket.
    ///
    /// A rejected endpoint is reported on the status line and never reaches
    /// the network.
    pub fn begin_run(&mut self) -> Result<PendingRun, EvaluationError> {
        let mut config = ComputeConfig::new(self.endpoint_url.trim());
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.as_str());
        }
        if let Err(err) = config.validate() {
            self.status.error(err.to_string());
            return Err(err);
        }
        save_compute_url(self.settings.as_mut(), &config.endpoint_url);

        let ticket = self.gate.begin();
        self.status.info(STATUS_LOADING_DEFINITION);
        Ok(PendingRun {
            ticket,
            config,
            definition_path: self.definition_path.clone(),
        })
    }

    /// The definition is loaded and the request is about to go out.
    pub fn mark_evaluating(&mut self, ticket: RunTicket) {
        if self.gate.is_current(ticket) {
            self.status.info(STATUS_EVALUATING);
        }
    }

    /// Applies a finished run unless a newer one has started since.
    pub fn complete_run(
        &mut self,
        ticket: RunTicket,
        result: Result<EvaluationResponse, EvaluationError>,
        kernel: &impl GeometryKernel,
    ) -> RunOutcome {
        if !self.gate.finish(ticket) {
            debug!(generation = ticket.generation(), "dropping stale evaluation result");
            return RunOutcome::Stale;
        }
        match result {
            Ok(response) => {
                let report = ingest(&mut self.world, &response, kernel);
                self.camera
                    .frame_bounds(&report.bounds, FramingPolicy::evaluation_results());
                self.toggles = build_toggles(&self.world);
                self.status.info(STATUS_DONE);
                RunOutcome::Applied {
                    meshes: report.meshes.len(),
                    skipped: report.skipped,
                }
            }
            Err(err) => {
                self.status.error(err.to_string());
                RunOutcome::Failed
            }
        }
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn object(&self, index: usize) -> Option<&SceneObject> {
        self.world.objects().get(index)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.current()
    }

    pub fn status_message(&self) -> &str {
        self.status.message()
    }

    pub fn status_is_error(&self) -> bool {
        self.status.is_error()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn toggles(&self) -> &[VisibilityToggle] {
        &self.toggles
    }

    /// Returns `false` for an unknown toggle index.
    pub fn set_toggle_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.toggles.get(index) {
            Some(toggle) => {
                apply_toggle(&mut self.world, toggle, visible);
                true
            }
            None => false,
        }
    }

    pub fn set_object_visible(&mut self, index: usize, visible: bool) -> bool {
        let Some(id) = self.world.objects().get(index).map(|o| o.id) else {
            return false;
        };
        self.world.set_visibility(id, Visibility::from_flag(visible))
    }
}

/// Runs one trigger end to end: validate, load the definition, evaluate,
/// ingest and frame.
pub async fn execute<T: Transport>(
    session: &RefCell<Session>,
    transport: T,
    params: &[Param],
    kernel: &impl GeometryKernel,
) -> RunOutcome {
    let pending = match session.borrow_mut().begin_run() {
        Ok(p) => p,
        Err(_) => return RunOutcome::Failed,
    };
    execute_pending(session, pending, transport, params, kernel).await
}

/// The network half of [`execute`], for callers that ran
/// [`Session::begin_run`] themselves.
///
/// The session is only borrowed between awaits, so a second trigger may
/// start while this one is in flight. Whichever started last wins.
pub async fn execute_pending<T: Transport>(
    session: &RefCell<Session>,
    pending: PendingRun,
    transport: T,
    params: &[Param],
    kernel: &impl GeometryKernel,
) -> RunOutcome {
    let client = EvaluationClient::new(pending.config.clone(), transport);

    let result = match client.fetch_definition(&pending.definition_path).await {
        Ok(definition) => {
            session.borrow_mut().mark_evaluating(pending.ticket);
            client.evaluate(&definition, params).await
        }
        Err(err) => Err(err),
    };
    session
        .borrow_mut()
        .complete_run(pending.ticket, result, kernel)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{RunOutcome, Session, execute};
    use compute::error::{EvaluationError, TransportError};
    use compute::transport::Transport;
    use formats::geometry::{DecodedObject, Mesh};
    use formats::kernel::{NativeKernel, encode_item_data};
    use formats::protocol::{DataTree, EvaluationResponse, InnerTree, Param, ResultItem};
    use pretty_assertions::assert_eq;
    use settings::{COMPUTE_URL_KEY, InMemorySettingsStore, SettingsStore, load_compute_url};

    struct StubTransport {
        definition: Option<Vec<u8>>,
        reply: String,
    }

    impl Transport for StubTransport {
        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(&str, &str)],
            _body: String,
        ) -> Result<String, TransportError> {
            Ok(self.reply.clone())
        }

        async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            self.definition
                .clone()
                .ok_or_else(|| TransportError::status(404, "not found"))
        }
    }

    fn quad_response() -> String {
        let quad = Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 2.0, 0.0],
                [0.0, 2.0, 0.0],
            ],
            vec![[0, 1, 2, 3]],
        );
        let data = encode_item_data(&DecodedObject::Mesh(quad)).expect("encode");
        let resp = EvaluationResponse {
            values: vec![DataTree {
                param_name: "Box".into(),
                inner_tree: InnerTree::single(ResultItem::new(
                    "Rhino.Geometry.Mesh",
                    serde_json::Value::String(data),
                )),
            }],
            ..Default::default()
        };
        serde_json::to_string(&resp).expect("json")
    }

    fn session_with_url(url: &str) -> Session {
        let mut store = InMemorySettingsStore::new();
        store.set(COMPUTE_URL_KEY, url).expect("store");
        Session::new(Box::new(store))
    }

    #[test]
    fn saved_url_prefills_endpoint() {
        let session = session_with_url("http://localhost:6500");
        assert_eq!(session.endpoint_url(), "http://localhost:6500");
        assert_eq!(
            Session::new(Box::new(InMemorySettingsStore::new())).endpoint_url(),
            ""
        );
    }

    #[test]
    fn empty_url_is_reported_without_a_ticket() {
        let mut session = Session::new(Box::new(InMemorySettingsStore::new()));
        let err = session.begin_run().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(session.status_message(), "Compute server URL required");
        assert!(session.status_is_error());
        assert!(!session.is_busy());
    }

    #[test]
    fn full_run_populates_scene_and_frames_camera() {
        let session = RefCell::new(session_with_url("http://localhost:6500"));
        let before = *session.borrow().camera();
        let transport = StubTransport {
            definition: Some(b"gh".to_vec()),
            reply: quad_response(),
        };
        let outcome = pollster::block_on(execute(
            &session,
            transport,
            &[Param::number("A", 50.0), Param::number("B", 5.0)],
            &NativeKernel::new(),
        ));
        assert_eq!(
            outcome,
            RunOutcome::Applied {
                meshes: 1,
                skipped: 0
            }
        );

        let s = session.borrow();
        assert_eq!(s.world().len(), 1);
        assert_eq!(s.object(0).map(|o| o.mesh.vertex_count()), Some(6));
        assert_eq!(s.status_message(), "Done");
        assert_ne!(s.camera().position, before.position);
        assert_eq!(s.camera().target.x, 1.0);
        assert_eq!(s.toggles().len(), 1);
        assert_eq!(s.toggles()[0].label, "Box");
    }

    #[test]
    fn missing_definition_is_reported() {
        let session = RefCell::new(session_with_url("http://localhost:6500"));
        let transport = StubTransport {
            definition: None,
            reply: String::new(),
        };
        let outcome = pollster::block_on(execute(&session, transport, &[], &NativeKernel::new()));
        assert_eq!(outcome, RunOutcome::Failed);
        let s = session.borrow();
        assert!(s.status_is_error());
        assert!(s.status_message().contains("./box.gh"));
        assert!(s.world().is_empty());
    }

    #[test]
    fn older_run_finishing_last_is_dropped() {
        let mut session = session_with_url("http://localhost:6500");
        let kernel = NativeKernel::new();
        let first = session.begin_run().expect("first");
        let second = session.begin_run().expect("second");

        let resp: EvaluationResponse = serde_json::from_str(&quad_response()).expect("parse");
        let applied = session.complete_run(second.ticket, Ok(resp), &kernel);
        assert!(matches!(applied, RunOutcome::Applied { meshes: 1, .. }));

        let stale = session.complete_run(
            first.ticket,
            Err(EvaluationError::Transport("timeout".into())),
            &kernel,
        );
        assert_eq!(stale, RunOutcome::Stale);
        assert_eq!(session.world().len(), 1);
        assert_eq!(session.status_message(), "Done");
    }

    #[test]
    fn toggles_hide_objects() {
        let mut session = session_with_url("http://localhost:6500");
        let run = session.begin_run().expect("run");
        let resp: EvaluationResponse = serde_json::from_str(&quad_response()).expect("parse");
        session.complete_run(run.ticket, Ok(resp), &NativeKernel::new());

        assert!(session.set_toggle_visible(0, false));
        assert_eq!(session.world().visible_objects().count(), 0);
        assert!(!session.set_toggle_visible(7, false));
        assert!(session.set_object_visible(0, true));
        assert_eq!(session.world().visible_objects().count(), 1);
    }

    #[test]
    fn successful_trigger_persists_url() {
        let mut session = Session::new(Box::new(InMemorySettingsStore::new()));
        session.set_endpoint_url(" http://compute.local:8081 ");
        session.begin_run().expect("run");
        assert_eq!(session.status_message(), "Loading Grasshopper file…");
        assert!(session.is_busy());
        assert_eq!(
            load_compute_url(session.settings()),
            Some("http://compute.local:8081".to_string())
        );
    }
}
