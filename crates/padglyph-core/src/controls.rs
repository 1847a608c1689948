//! Control name spaces for gamepads, keyboards and mice
//!
//! Item names in a database are `<control>_<variant>`; this module maps the
//! `<control>` part onto a category and a numeric control id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three device kinds a handle can be created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Gamepad,
    Keyboard,
    Mouse,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [DeviceKind::Gamepad, DeviceKind::Keyboard, DeviceKind::Mouse];

    /// Categories resolved for this kind, in lookup order
    pub const fn categories(self) -> &'static [Category] {
        match self {
            DeviceKind::Gamepad => &[Category::GamepadAxis, Category::GamepadButton],
            DeviceKind::Keyboard => &[Category::Scancode],
            DeviceKind::Mouse => &[Category::MouseIcon],
        }
    }

    /// Number of art variants each control may carry
    pub const fn max_variants(self) -> usize {
        match self {
            DeviceKind::Gamepad => 8,
            DeviceKind::Keyboard | DeviceKind::Mouse => 4,
        }
    }

    /// Resolve a root control name, trying categories in order
    pub fn lookup(self, name: &str) -> Option<(Category, usize)> {
        self.categories()
            .iter()
            .find_map(|&category| category.from_name(name).map(|id| (category, id)))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Gamepad => "gamepad",
            DeviceKind::Keyboard => "keyboard",
            DeviceKind::Mouse => "mouse",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown device kind {:?}", s))
    }
}

/// A table of controls addressed by numeric id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    GamepadAxis,
    GamepadButton,
    Scancode,
    MouseIcon,
}

impl Category {
    /// Number of control ids in this category
    pub const fn count(self) -> usize {
        match self {
            Category::GamepadAxis => AXIS_NAMES.len(),
            Category::GamepadButton => BUTTON_NAMES.len(),
            Category::Scancode => SCANCODE_NAMES.len(),
            Category::MouseIcon => MOUSE_NAMES.len(),
        }
    }

    pub const fn kind(self) -> DeviceKind {
        match self {
            Category::GamepadAxis | Category::GamepadButton => DeviceKind::Gamepad,
            Category::Scancode => DeviceKind::Keyboard,
            Category::MouseIcon => DeviceKind::Mouse,
        }
    }

    pub const fn max_variants(self) -> usize {
        self.kind().max_variants()
    }

    /// Control used as generic art when a control has none of its own
    pub const fn sentinel(self) -> Option<usize> {
        match self {
            Category::Scancode => Some(Scancode::UNKNOWN.0 as usize),
            Category::MouseIcon => Some(MouseIcon::None as usize),
            Category::GamepadAxis | Category::GamepadButton => None,
        }
    }

    /// Map a root control name to its id (case-insensitive)
    pub fn from_name(self, name: &str) -> Option<usize> {
        match self {
            Category::GamepadAxis => position_of(&AXIS_NAMES, name),
            Category::GamepadButton => position_of(&BUTTON_NAMES, name),
            Category::MouseIcon => position_of(&MOUSE_NAMES, name),
            Category::Scancode => Scancode::from_name(name).map(|code| usize::from(code.0)),
        }
    }

    /// Canonical name of a control id
    pub fn name_of(self, id: usize) -> Option<&'static str> {
        let name = match self {
            Category::GamepadAxis => AXIS_NAMES.get(id),
            Category::GamepadButton => BUTTON_NAMES.get(id),
            Category::MouseIcon => MOUSE_NAMES.get(id),
            Category::Scancode => SCANCODE_NAMES.get(id),
        };
        name.copied().filter(|n| !n.is_empty())
    }
}

fn position_of(names: &[&str], name: &str) -> Option<usize> {
    names.iter().position(|n| n.eq_ignore_ascii_case(name))
}

const AXIS_NAMES: [&str; 6] = [
    "leftx",
    "lefty",
    "rightx",
    "righty",
    "lefttrigger",
    "righttrigger",
];

/// Gamepad axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl GamepadAxis {
    pub const ALL: [GamepadAxis; 6] = [
        GamepadAxis::LeftX,
        GamepadAxis::LeftY,
        GamepadAxis::RightX,
        GamepadAxis::RightY,
        GamepadAxis::LeftTrigger,
        GamepadAxis::RightTrigger,
    ];
}

const BUTTON_NAMES: [&str; 26] = [
    "south",
    "east",
    "west",
    "north",
    "back",
    "guide",
    "start",
    "leftstick",
    "rightstick",
    "leftshoulder",
    "rightshoulder",
    "dpup",
    "dpdown",
    "dpleft",
    "dpright",
    "misc1",
    "right_paddle1",
    "left_paddle1",
    "right_paddle2",
    "left_paddle2",
    "touchpad",
    "misc2",
    "misc3",
    "misc4",
    "misc5",
    "misc6",
];

/// Gamepad buttons, named by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Misc1,
    RightPaddle1,
    LeftPaddle1,
    RightPaddle2,
    LeftPaddle2,
    Touchpad,
    Misc2,
    Misc3,
    Misc4,
    Misc5,
    Misc6,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 26] = [
        GamepadButton::South,
        GamepadButton::East,
        GamepadButton::West,
        GamepadButton::North,
        GamepadButton::Back,
        GamepadButton::Guide,
        GamepadButton::Start,
        GamepadButton::LeftStick,
        GamepadButton::RightStick,
        GamepadButton::LeftShoulder,
        GamepadButton::RightShoulder,
        GamepadButton::DpadUp,
        GamepadButton::DpadDown,
        GamepadButton::DpadLeft,
        GamepadButton::DpadRight,
        GamepadButton::Misc1,
        GamepadButton::RightPaddle1,
        GamepadButton::LeftPaddle1,
        GamepadButton::RightPaddle2,
        GamepadButton::LeftPaddle2,
        GamepadButton::Touchpad,
        GamepadButton::Misc2,
        GamepadButton::Misc3,
        GamepadButton::Misc4,
        GamepadButton::Misc5,
        GamepadButton::Misc6,
    ];
}

const MOUSE_NAMES: [&str; 8] = ["none", "left", "middle", "right", "x1", "x2", "move", "scroll"];

/// Mouse icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseIcon {
    None,
    Left,
    Middle,
    Right,
    X1,
    X2,
    Move,
    Scroll,
}

impl MouseIcon {
    pub const ALL: [MouseIcon; 8] = [
        MouseIcon::None,
        MouseIcon::Left,
        MouseIcon::Middle,
        MouseIcon::Right,
        MouseIcon::X1,
        MouseIcon::X2,
        MouseIcon::Move,
        MouseIcon::Scroll,
    ];
}

/// Key names by USB HID usage id; empty slots have no key
#[rustfmt::skip]
const SCANCODE_NAMES: [&str; 232] = [
    "", "", "", "", "A", "B", "C", "D",
    "E", "F", "G", "H", "I", "J", "K", "L",
    "M", "N", "O", "P", "Q", "R", "S", "T",
    "U", "V", "W", "X", "Y", "Z", "1", "2",
    "3", "4", "5", "6", "7", "8", "9", "0",
    "Return", "Escape", "Backspace", "Tab", "Space", "-", "=", "[",
    "]", "\\", "#", ";", "'", "`", ",", ".",
    "/", "CapsLock", "F1", "F2", "F3", "F4", "F5", "F6",
    "F7", "F8", "F9", "F10", "F11", "F12", "PrintScreen", "ScrollLock",
    "Pause", "Insert", "Home", "PageUp", "Delete", "End", "PageDown", "Right",
    "Left", "Down", "Up", "Numlock", "Keypad /", "Keypad *", "Keypad -", "Keypad +",
    "Keypad Enter", "Keypad 1", "Keypad 2", "Keypad 3",
    "Keypad 4", "Keypad 5", "Keypad 6", "Keypad 7",
    "Keypad 8", "Keypad 9", "Keypad 0", "Keypad .",
    "NonUSBackslash", "Application", "Power", "Keypad =",
    "F13", "F14", "F15", "F16", "F17", "F18", "F19", "F20",
    "F21", "F22", "F23", "F24", "Execute", "Help", "Menu", "Select",
    "Stop", "Again", "Undo", "Cut", "Copy", "Paste", "Find", "Mute",
    "VolumeUp", "VolumeDown", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "Left Ctrl", "Left Shift", "Left Alt", "Left GUI",
    "Right Ctrl", "Right Shift", "Right Alt", "Right GUI",
];

/// Names for keys whose conventional name can't appear in an art file name
const FILESYSTEM_SAFE_NAMES: [(&str, u16); 11] = [
    ("apostrophe", 52),
    ("backslash", 49),
    ("comma", 54),
    ("equals", 46),
    ("leftbracket", 47),
    ("rightbracket", 48),
    ("period", 55),
    ("semicolon", 51),
    ("slash", 56),
    ("tilde", 53),
    ("unknown", 0),
];

/// Keyboard scancode (USB HID usage id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scancode(pub u16);

impl Scancode {
    pub const UNKNOWN: Scancode = Scancode(0);
    pub const A: Scancode = Scancode(4);
    pub const Z: Scancode = Scancode(29);
    pub const RETURN: Scancode = Scancode(40);
    pub const ESCAPE: Scancode = Scancode(41);
    pub const SPACE: Scancode = Scancode(44);
    pub const APOSTROPHE: Scancode = Scancode(52);
    pub const LEFT_CTRL: Scancode = Scancode(224);
    pub const LEFT_SHIFT: Scancode = Scancode(225);
    pub const LEFT_ALT: Scancode = Scancode(226);
    pub const LEFT_GUI: Scancode = Scancode(227);
    pub const RIGHT_CTRL: Scancode = Scancode(228);
    pub const RIGHT_SHIFT: Scancode = Scancode(229);
    pub const RIGHT_ALT: Scancode = Scancode(230);
    pub const RIGHT_GUI: Scancode = Scancode(231);

    /// Resolve a key name, including the file-system-safe aliases
    pub fn from_name(name: &str) -> Option<Scancode> {
        if name.is_empty() {
            return None;
        }
        position_of(&SCANCODE_NAMES, name)
            .and_then(|id| u16::try_from(id).ok())
            .or_else(|| {
                FILESYSTEM_SAFE_NAMES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .map(|&(_, code)| code)
            })
            .map(Scancode)
    }

    pub fn name(self) -> Option<&'static str> {
        Category::Scancode.name_of(usize::from(self.0))
    }

    /// The right-hand twin of a left-hand modifier key
    pub fn duplicate(self) -> Option<Scancode> {
        match self {
            Scancode::LEFT_CTRL => Some(Scancode::RIGHT_CTRL),
            Scancode::LEFT_SHIFT => Some(Scancode::RIGHT_SHIFT),
            Scancode::LEFT_ALT => Some(Scancode::RIGHT_ALT),
            Scancode::LEFT_GUI => Some(Scancode::RIGHT_GUI),
            _ => None,
        }
    }
}

/// Any addressable control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Axis(GamepadAxis),
    Button(GamepadButton),
    Key(Scancode),
    Mouse(MouseIcon),
}

impl Control {
    pub fn category(self) -> Category {
        match self {
            Control::Axis(_) => Category::GamepadAxis,
            Control::Button(_) => Category::GamepadButton,
            Control::Key(_) => Category::Scancode,
            Control::Mouse(_) => Category::MouseIcon,
        }
    }

    /// Build a control from its category and numeric id
    pub fn new(category: Category, id: usize) -> Option<Control> {
        match category {
            Category::GamepadAxis => GamepadAxis::ALL.get(id).copied().map(Control::Axis),
            Category::GamepadButton => GamepadButton::ALL.get(id).copied().map(Control::Button),
            Category::Scancode => u16::try_from(id)
                .ok()
                .filter(|_| id < category.count())
                .map(|code| Control::Key(Scancode(code))),
            Category::MouseIcon => MouseIcon::ALL.get(id).copied().map(Control::Mouse),
        }
    }

    /// Look up a control by name among `kind`'s categories
    pub fn parse(kind: DeviceKind, name: &str) -> Option<Control> {
        let (category, id) = kind.lookup(name)?;
        Control::new(category, id)
    }

    /// Numeric id within the category; may be out of range for scancodes
    pub fn id(self) -> usize {
        match self {
            Control::Axis(axis) => axis as usize,
            Control::Button(button) => button as usize,
            Control::Key(code) => usize::from(code.0),
            Control::Mouse(icon) => icon as usize,
        }
    }
}

impl From<GamepadAxis> for Control {
    fn from(axis: GamepadAxis) -> Self {
        Control::Axis(axis)
    }
}

impl From<GamepadButton> for Control {
    fn from(button: GamepadButton) -> Self {
        Control::Button(button)
    }
}

impl From<Scancode> for Control {
    fn from(code: Scancode) -> Self {
        Control::Key(code)
    }
}

impl From<MouseIcon> for Control {
    fn from(icon: MouseIcon) -> Self {
        Control::Mouse(icon)
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category().name_of(self.id()) {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}#{}", self.category(), self.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamepad_lookup_prefers_axes() {
        assert_eq!(
            DeviceKind::Gamepad.lookup("leftx"),
            Some((Category::GamepadAxis, GamepadAxis::LeftX as usize))
        );
        assert_eq!(
            DeviceKind::Gamepad.lookup("South"),
            Some((Category::GamepadButton, GamepadButton::South as usize))
        );
        assert_eq!(
            DeviceKind::Gamepad.lookup("left_paddle2"),
            Some((Category::GamepadButton, GamepadButton::LeftPaddle2 as usize))
        );
        assert_eq!(DeviceKind::Gamepad.lookup("a"), None);
    }

    #[test]
    fn test_name_tables_match_enums() {
        assert_eq!(Category::GamepadAxis.count(), GamepadAxis::ALL.len());
        assert_eq!(
            Category::GamepadButton.name_of(GamepadButton::Misc6 as usize),
            Some("misc6")
        );
        assert_eq!(Category::MouseIcon.name_of(MouseIcon::Scroll as usize), Some("scroll"));
        assert_eq!(Scancode::RIGHT_GUI.name(), Some("Right GUI"));
        assert_eq!(Scancode::Z.name(), Some("Z"));
        assert_eq!(Scancode::UNKNOWN.name(), None);
    }

    #[test]
    fn test_scancode_names() {
        assert_eq!(Scancode::from_name("a"), Some(Scancode::A));
        assert_eq!(Scancode::from_name("left ctrl"), Some(Scancode::LEFT_CTRL));
        assert_eq!(Scancode::from_name("Keypad 7"), Some(Scancode(95)));
        assert_eq!(Scancode::from_name("F24"), Some(Scancode(115)));
        assert_eq!(Scancode::from_name("'"), Some(Scancode::APOSTROPHE));
        assert_eq!(Scancode::from_name("apostrophe"), Some(Scancode::APOSTROPHE));
        assert_eq!(Scancode::from_name("backslash"), Some(Scancode(49)));
        assert_eq!(Scancode::from_name("unknown"), Some(Scancode::UNKNOWN));
        assert_eq!(Scancode::from_name(""), None);
        assert_eq!(Scancode::from_name("hyper"), None);
    }

    #[test]
    fn test_modifier_duplicates() {
        assert_eq!(Scancode::LEFT_SHIFT.duplicate(), Some(Scancode::RIGHT_SHIFT));
        assert_eq!(Scancode::RIGHT_SHIFT.duplicate(), None);
        assert_eq!(Scancode::A.duplicate(), None);
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(Category::Scancode.sentinel(), Some(0));
        assert_eq!(Category::MouseIcon.sentinel(), Some(MouseIcon::None as usize));
        assert_eq!(Category::GamepadButton.sentinel(), None);
    }

    #[test]
    fn test_device_kind_parse() {
        assert_eq!("Keyboard".parse::<DeviceKind>(), Ok(DeviceKind::Keyboard));
        assert!("joystick".parse::<DeviceKind>().is_err());
        assert_eq!(DeviceKind::Mouse.to_string(), "mouse");
    }

    #[test]
    fn test_control_display() {
        assert_eq!(Control::from(GamepadButton::DpadUp).to_string(), "dpup");
        assert_eq!(Control::from(Scancode(500)).to_string(), "Scancode#500");
    }

    #[test]
    fn test_control_from_name() {
        assert_eq!(
            Control::parse(DeviceKind::Gamepad, "lefttrigger"),
            Some(Control::Axis(GamepadAxis::LeftTrigger))
        );
        assert_eq!(
            Control::parse(DeviceKind::Gamepad, "touchpad"),
            Some(Control::Button(GamepadButton::Touchpad))
        );
        assert_eq!(
            Control::parse(DeviceKind::Keyboard, "semicolon"),
            Some(Control::Key(Scancode(51)))
        );
        assert_eq!(
            Control::parse(DeviceKind::Mouse, "x2"),
            Some(Control::Mouse(MouseIcon::X2))
        );
        assert_eq!(Control::parse(DeviceKind::Mouse, "south"), None);
        assert_eq!(Control::new(Category::Scancode, 232), None);
        assert_eq!(Category::GamepadButton.count(), GamepadButton::ALL.len());
        assert_eq!(Category::MouseIcon.count(), MouseIcon::ALL.len());
    }
}
