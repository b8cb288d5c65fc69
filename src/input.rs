// ==============================================================================
// input.rs — KEY EDGES -> LOGICAL CONTROLS
// ------------------------------------------------------------------------------
// Raw key events (from the websocket) are normalized, mapped through
// KeyBindings to a logical Control, and stored as a tagged Edge:
//
//     None --(key down)--> Down --(key up)--> Up --(consumed)--> None
//
// Down persists while the key is held. Up persists until the control policy
// reports the control as released; `clear_released` is the only way an Up
// edge goes away. Writes are last-write-wins between ticks.
// ==============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Accelerate,
    Reverse,
    SteerLeft,
    SteerRight,
    Jump,
    RollLeft,
    RollRight,
    Reset,
}

impl Control {
    pub const COUNT: usize = 8;

    pub const ALL: [Control; Control::COUNT] = [
        Control::Accelerate,
        Control::Reverse,
        Control::SteerLeft,
        Control::SteerRight,
        Control::Jump,
        Control::RollLeft,
        Control::RollRight,
        Control::Reset,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    None,
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub brake: bool,         // shift held
    pub camera_switch: bool, // camera modifier held
}

/// One raw key transition as reported by the input-capture side.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: String,
    pub edge: Edge,
    pub modifiers: Modifiers,
}

/// Multi-character key names ("ArrowUp", "Shift") are kept verbatim,
/// single characters are lower-cased so "W" and "w" bind the same control.
pub fn normalize_key(raw: &str) -> String {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, Control>", into = "HashMap<String, Control>")]
pub struct KeyBindings(HashMap<String, Control>);

impl From<HashMap<String, Control>> for KeyBindings {
    fn from(map: HashMap<String, Control>) -> Self {
        Self::new(map)
    }
}

impl From<KeyBindings> for HashMap<String, Control> {
    fn from(bindings: KeyBindings) -> Self {
        bindings.0
    }
}

impl KeyBindings {
    pub fn new(map: HashMap<String, Control>) -> Self {
        Self(map.into_iter().map(|(k, c)| (normalize_key(&k), c)).collect())
    }

    pub fn lookup(&self, raw_key: &str) -> Option<Control> {
        self.0.get(&normalize_key(raw_key)).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let pairs = [
            ("w", Control::Accelerate),
            ("ArrowUp", Control::Accelerate),
            ("s", Control::Reverse),
            ("ArrowDown", Control::Reverse),
            ("a", Control::SteerLeft),
            ("ArrowLeft", Control::SteerLeft),
            ("d", Control::SteerRight),
            ("ArrowRight", Control::SteerRight),
            (" ", Control::Jump),
            ("q", Control::RollLeft),
            ("e", Control::RollRight),
            ("r", Control::Reset),
        ];
        Self::new(pairs.into_iter().map(|(k, c)| (k.to_string(), c)).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    edges: [Edge; Control::COUNT],
    modifiers: Modifiers,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw key event. Modifier flags are always taken from the
    /// event, even when the key itself is unbound.
    pub fn apply(&mut self, event: &KeyEvent, bindings: &KeyBindings) -> Option<Control> {
        self.modifiers = event.modifiers;

        let Some(control) = bindings.lookup(&event.key) else {
            tracing::trace!(key = %event.key, "unbound key");
            return None;
        };

        self.set(control, event.edge);
        Some(control)
    }

    pub fn set(&mut self, control: Control, edge: Edge) {
        self.edges[control.index()] = edge;
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn edge(&self, control: Control) -> Edge {
        self.edges[control.index()]
    }

    pub fn is_down(&self, control: Control) -> bool {
        self.edge(control) == Edge::Down
    }

    pub fn is_up(&self, control: Control) -> bool {
        self.edge(control) == Edge::Up
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Drop the Up edges the policy acted on. A control that was pressed
    /// again since the snapshot (now Down) is left alone.
    pub fn clear_released(&mut self, released: &[Control]) {
        for &control in released {
            if self.is_up(control) {
                self.set(control, Edge::None);
            }
        }
    }
}
