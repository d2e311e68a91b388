//! Synthetic DOM events.

/// Mouse fields carried by click and pointer events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseDetail {
    pub client_x: f64,
    pub client_y: f64,
    pub button: i16,
    pub buttons: u16,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardDetail {
    pub key: String,
    pub code: String,
    pub repeat: bool,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputDetail {
    pub input_type: String,
    pub data: Option<String>,
    pub is_composing: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventDetail {
    #[default]
    None,
    Mouse(MouseDetail),
    Keyboard(KeyboardDetail),
    Input(InputDetail),
}

/// An event dispatched against a [`Document`](crate::Document) node.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub detail: EventDetail,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// New event with the bubbling and cancelable flags a browser uses for
    /// `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        let bubbles = !matches!(
            event_type.as_str(),
            "focus" | "blur" | "mouseenter" | "mouseleave" | "load" | "scroll"
        );
        let cancelable = matches!(
            event_type.as_str(),
            "click"
                | "mousedown"
                | "mouseup"
                | "mouseover"
                | "mouseout"
                | "mousemove"
                | "keydown"
                | "keyup"
                | "keypress"
                | "submit"
                | "beforeinput"
        );
        Self {
            event_type,
            bubbles,
            cancelable,
            timestamp: 0,
            detail: EventDetail::None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn mouse(&self) -> Option<&MouseDetail> {
        match &self.detail {
            EventDetail::Mouse(m) => Some(m),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&KeyboardDetail> {
        match &self.detail {
            EventDetail::Keyboard(k) => Some(k),
            _ => None,
        }
    }

    pub fn input(&self) -> Option<&InputDetail> {
        match &self.detail {
            EventDetail::Input(i) => Some(i),
            _ => None,
        }
    }
}
