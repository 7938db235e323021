use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use fancy_regex::Regex;

mod behavior;
mod dom;
mod events;
mod html;
mod selector;

pub use behavior::{
    DEMO_PAGE_HTML, ENABLE_BUTTON_ID, ENABLED_ALERT_TEXT, EXPANDED_PAGE_HEIGHT, SCROLL_BUTTON_ID,
    TOGGLE_CLASS, install_page_behavior, open_demo_page,
};
pub use dom::NodeId;
pub use events::{EventState, ListenerId};

use dom::{Dom, has_class, truncate_chars};
use events::{HandlerFn, Listener, ListenerStore};
use html::parse_document;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    MissingElement(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    InvalidPattern(String),
    Runtime(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::MissingElement(name) => write!(f, "missing element: {name}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::InvalidPattern(msg) => write!(f, "invalid pattern: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

type LoadHook = Rc<dyn Fn(&mut Page) -> Result<()>>;

/// In-memory page with native event wiring. Listeners are plain Rust
/// closures dispatched synchronously on a single thread; nothing here
/// interprets script text.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    load_hooks: Vec<LoadHook>,
    loaded: bool,
    alerts: Vec<String>,
    next_listener_id: u64,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_document(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            load_hooks: Vec::new(),
            loaded: false,
            alerts: Vec::new(),
            next_listener_id: 1,
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    /// Registers a hook to run when the page load signal fires.
    pub fn on_load<F>(&mut self, hook: F)
    where
        F: Fn(&mut Page) -> Result<()> + 'static,
    {
        self.load_hooks.push(Rc::new(hook));
    }

    /// Fires the load signal. Hooks run in registration order; the first
    /// error halts the remaining hooks, but any listeners they already
    /// registered stay in place. The signal fires at most once per page;
    /// repeat calls are no-ops.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;
        self.trace_line("[load] firing".to_string());

        let hooks = self.load_hooks.clone();
        for hook in hooks {
            hook(self)?;
        }
        Ok(())
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn element_by_id(&self, id: &str) -> Result<NodeId> {
        self.dom
            .by_id(id)
            .ok_or_else(|| Error::MissingElement(id.to_string()))
    }

    /// First element in document order carrying the class. Later elements
    /// with the same class are deliberately ignored.
    pub fn first_by_class(&self, class_name: &str) -> Result<NodeId> {
        self.dom
            .elements_by_class_name(class_name)
            .into_iter()
            .next()
            .ok_or_else(|| Error::MissingElement(format!(".{class_name}")))
    }

    pub fn add_listener<F>(&mut self, selector: &str, event: &str, handler: F) -> Result<ListenerId>
    where
        F: Fn(&mut Page, &mut EventState) -> Result<()> + 'static,
    {
        let target = self.select_one(selector)?;
        Ok(self.add_node_listener(target, event, handler))
    }

    pub fn add_node_listener<F>(&mut self, node: NodeId, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&mut Page, &mut EventState) -> Result<()> + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        let handler: HandlerFn = Rc::new(handler);
        self.listeners.add(
            node,
            event.to_string(),
            Listener {
                id,
                capture: false,
                handler,
            },
        );
        id
    }

    pub fn add_capture_listener<F>(&mut self, node: NodeId, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&mut Page, &mut EventState) -> Result<()> + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        let handler: HandlerFn = Rc::new(handler);
        self.listeners.add(
            node,
            event.to_string(),
            Listener {
                id,
                capture: true,
                handler,
            },
        );
        id
    }

    pub fn remove_listener(&mut self, listener_id: ListenerId) -> bool {
        self.listeners.remove(listener_id)
    }

    /// Simulates a user click. Disabled controls swallow the click without
    /// dispatching anything, as a browser would.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            let label = self.node_label(target);
            self.trace_line(format!("[click] suppressed target={label} disabled"));
            return Ok(());
        }
        self.dispatch_event(target, "click")?;
        Ok(())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    /// Records a blocking informational dialog. The message is appended to
    /// the alert log; there is no user to dismiss it.
    pub fn alert(&mut self, message: &str) {
        self.trace_line(format!("[alert] {message}"));
        self.alerts.push(message.to_string());
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn disabled(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.disabled(target))
    }

    pub fn set_disabled(&mut self, selector: &str, disabled: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dom.set_disabled(target, disabled)
    }

    pub fn node_disabled(&self, node: NodeId) -> bool {
        self.dom.disabled(node)
    }

    pub fn set_node_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        self.dom.set_disabled(node, disabled)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn style(&self, selector: &str, prop: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, prop)
    }

    pub fn set_style(&mut self, selector: &str, prop: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dom.style_set(target, prop, value)
    }

    /// Inline style of the document root element (`documentElement`).
    pub fn root_style(&self, prop: &str) -> Result<String> {
        let root = self.document_element()?;
        self.dom.style_get(root, prop)
    }

    pub fn set_root_style(&mut self, prop: &str, value: &str) -> Result<()> {
        let root = self.document_element()?;
        self.dom.style_set(root, prop, value)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.disabled(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, prop: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, prop)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{prop}: {expected}"),
                actual: format!("{prop}: {actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_root_style(&self, prop: &str, expected: &str) -> Result<()> {
        let root = self.document_element()?;
        let actual = self.dom.style_get(root, prop)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: "(document root)".to_string(),
                expected: format!("{prop}: {expected}"),
                actual: format!("{prop}: {actual}"),
                dom_snippet: self.node_snippet(root),
            });
        }
        Ok(())
    }

    pub fn assert_text_contains(&self, selector: &str, needle: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if !actual.contains(needle) {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("text containing {needle:?}"),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_text_excludes(&self, selector: &str, needle: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual.contains(needle) {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("text excluding {needle:?}"),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_text_matches(&self, selector: &str, pattern: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        let regex =
            Regex::new(pattern).map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))?;
        let matched = regex
            .is_match(&actual)
            .map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))?;
        if !matched {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("text matching /{pattern}/"),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_alerts(&self, expected: &[&str]) -> Result<()> {
        let actual: Vec<&str> = self.alerts.iter().map(String::as_str).collect();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: "(alert log)".to_string(),
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
                dom_snippet: String::new(),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn document_element(&self) -> Result<NodeId> {
        self.dom
            .document_element()
            .ok_or_else(|| Error::Runtime("document has no root element".into()))
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let mut event = EventState::new(event_type, target);

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        if path.is_empty() {
            return Ok(event);
        }

        // Capture phase.
        if path.len() >= 2 {
            for node in &path[..path.len() - 1] {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, true)?;
                if event.propagation_stopped {
                    return Ok(event);
                }
            }
        }

        // Target phase: capture listeners first, then bubble listeners.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if event.propagation_stopped {
            return Ok(event);
        }
        self.invoke_listeners(target, &mut event, false)?;
        if event.propagation_stopped {
            return Ok(event);
        }

        // Bubble phase.
        if path.len() >= 2 {
            for node in path[..path.len() - 1].iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
                if event.propagation_stopped {
                    return Ok(event);
                }
            }
        }

        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.node_label(event.target);
                let current_label = self.node_label(event.current_target);
                self.trace_line(format!(
                    "[event] {} target={} current={} phase={}",
                    event.event_type, target_label, current_label, phase
                ));
            }
            (listener.handler)(self, event)?;
            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    fn node_label(&self, node_id: NodeId) -> String {
        let tag = self.dom.tag_name(node_id).unwrap_or("#node");
        match self.dom.attr(node_id, "id") {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        }
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}

#[cfg(test)]
mod tests;
