use crate::config::ContextConfig;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tellus_delivery::Dispatcher;
use tellus_model::{Event, ExecInfo, Execution, Session, State, Telemetry, Transaction};
use tellus_types::{
    default_error_handler, SharedErrorHandler, StackImbalance, TelemetryError,
};
use tracing::{debug, trace};

static NEXT_THREAD_SEQ: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_SEQ: u64 = NEXT_THREAD_SEQ.fetch_add(1, Ordering::Relaxed);
}

/// Small per-process number identifying the calling thread.
fn thread_seq() -> u64 {
    THREAD_SEQ.with(|seq| *seq)
}

/// The stack of open containers for one flow of control.
///
/// The session is always at the bottom; `open` holds the containers
/// above it, innermost last. These are usually transactions, but any
/// [`Execution`] kind can be pushed. A container joins its parent's
/// children when it ends, which keeps siblings in creation order because
/// nothing else can be added to the parent while it is open.
pub struct TelemetryContext {
    dispatcher: Arc<dyn Dispatcher>,
    handler: SharedErrorHandler,
    operation_name: Option<String>,
    reporting_node: String,
    process_id: u32,
    session: Session,
    open: Vec<Box<dyn Execution>>,
}

impl TelemetryContext {
    /// Creates a context and opens its first session.
    pub fn new(config: ContextConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::with_error_handler(config, dispatcher, default_error_handler())
    }

    pub fn with_error_handler(
        config: ContextConfig,
        dispatcher: Arc<dyn Dispatcher>,
        handler: SharedErrorHandler,
    ) -> Self {
        let reporting_node = config.resolve_reporting_node();
        let process_id = config.resolve_process_id();
        let mut context = Self {
            dispatcher,
            handler,
            operation_name: config.operation_name,
            reporting_node,
            process_id,
            session: Session::new(),
            open: Vec::new(),
        };
        context.start_session();
        context
    }

    pub fn reporting_node(&self) -> &str {
        &self.reporting_node
    }

    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// `<process id>.<thread>` for the calling thread.
    pub fn execution_context(&self) -> String {
        format!("{}.{}", self.process_id, thread_seq())
    }

    /// Discards whatever is open and begins a new session.
    pub fn start_session(&mut self) {
        if !self.open.is_empty() {
            debug!(
                open = self.open.len(),
                "starting a session over open transactions, discarding them"
            );
        }
        self.open.clear();
        self.session = self.new_session();
    }

    fn new_session(&self) -> Session {
        let mut session = Session::new();
        if let Some(name) = &self.operation_name {
            session.set_operation_name(name.clone());
        }
        let info = session.info_mut();
        info.set_reporting_node(self.reporting_node.clone());
        info.set_execution_context(self.execution_context());
        trace!(session_id = %session.entity_id(), "session started");
        session
    }

    /// Opens a transaction under the current top of the stack.
    pub fn begin_transaction(&mut self, resource_id: &str) -> &mut Transaction {
        let mut tx = Transaction::with_parent(self.current().info().entity_id());
        tx.set_resource_id(resource_id);
        tx.info_mut().set_reporting_node(self.reporting_node.clone());
        self.open.push(Box::new(tx));
        self.open
            .last_mut()
            .and_then(|top| top.as_any_mut().downcast_mut::<Transaction>())
            .expect("transaction was pushed just above")
    }

    /// Puts an application container on the stack.
    ///
    /// It is linked to the current top unless it already names a parent,
    /// gets the reporting node, and from then on is ended like a
    /// transaction begun here.
    pub fn push_transaction(&mut self, mut container: Box<dyn Execution>) {
        let parent = self.current().info().entity_id();
        let info = container.info_mut();
        info.link_parent(parent);
        info.set_reporting_node(self.reporting_node.clone());
        self.open.push(container);
    }

    /// Takes the innermost container off the stack as it is, neither
    /// completed nor attached to its parent.
    ///
    /// Returns `None` when only the session is open; the session is never
    /// popped.
    pub fn pop_transaction(&mut self) -> Option<Box<dyn Execution>> {
        self.open.pop()
    }

    /// The innermost open container, the session when nothing else is open.
    pub fn peek_transaction(&self) -> &dyn Execution {
        match self.open.last() {
            Some(top) => &**top,
            None => &self.session,
        }
    }

    pub fn peek_transaction_mut(&mut self) -> &mut dyn Execution {
        match self.open.last_mut() {
            Some(top) => &mut **top,
            None => &mut self.session,
        }
    }

    /// Completes the innermost container and attaches it to its parent.
    ///
    /// With no transaction open this does nothing beyond reporting a
    /// [`StackImbalance::UnmatchedEnd`].
    pub fn end_transaction(&mut self) {
        let Some(mut top) = self.open.pop() else {
            self.report(StackImbalance::UnmatchedEnd);
            return;
        };
        top.exec_mut().complete();
        self.current_mut().add_child(top);
    }

    /// Closes open transactions, completes the session, hands it to the
    /// dispatcher and opens a new session.
    pub fn end_session(&mut self) {
        self.close_dangling();
        self.session.complete();
        let fresh = self.new_session();
        let finished = mem::replace(&mut self.session, fresh);
        debug!(
            session_id = %finished.entity_id(),
            children = finished.children().len(),
            "session ended"
        );
        self.dispatcher.send_telemetry(Box::new(finished));
    }

    /// Like [`end_session`](Self::end_session) without opening a new
    /// session. For shutdown.
    pub fn close(mut self) {
        self.close_dangling();
        self.session.complete();
        debug!(session_id = %self.session.entity_id(), "context closed");
        let TelemetryContext {
            dispatcher,
            session,
            ..
        } = self;
        dispatcher.send_telemetry(Box::new(session));
    }

    fn close_dangling(&mut self) {
        let count = self.open.len();
        if count == 0 {
            return;
        }
        self.report(StackImbalance::DanglingTransactions { count });
        while !self.open.is_empty() {
            self.end_transaction();
        }
    }

    /// Records an event under the current top of the stack.
    pub fn new_event(&mut self, subtype: &str) -> &mut Event {
        let mut event = Event::typed(subtype);
        event.info_mut().set_reporting_node(self.reporting_node.clone());
        self.current_mut().adopt(event)
    }

    /// Records a state under the current top of the stack.
    pub fn new_state(&mut self) -> &mut State {
        let mut state = State::new();
        state.info_mut().set_reporting_node(self.reporting_node.clone());
        self.current_mut().adopt(state)
    }

    /// Sends an entity right away, outside the session tree.
    ///
    /// Reporting node and execution context are filled in when absent.
    pub fn send_beacon(&self, mut beacon: Box<dyn Telemetry>) {
        let info = beacon.info_mut();
        if info.reporting_node().is_none() {
            info.set_reporting_node(self.reporting_node.clone());
        }
        if info.execution_context().is_none() {
            info.set_execution_context(self.execution_context());
        }
        self.dispatcher.send_telemetry(beacon);
    }

    /// The innermost open container.
    pub fn current(&self) -> &ExecInfo {
        self.peek_transaction().exec()
    }

    pub fn current_mut(&mut self) -> &mut ExecInfo {
        self.peek_transaction_mut().exec_mut()
    }

    /// The open session. Containers still on the stack are not yet among
    /// its children.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The session itself, even while transactions are open above it.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Number of open containers, the session included.
    pub fn depth(&self) -> usize {
        1 + self.open.len()
    }

    fn report(&self, imbalance: StackImbalance) {
        trace!(%imbalance, "unbalanced execution stack");
        self.handler
            .on_error(&TelemetryError::StackImbalance(imbalance));
    }
}
