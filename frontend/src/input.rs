use std::collections::HashMap;

use invaders_core::core::InputButton;
use sdl2::keyboard::Scancode;

/// Maps SDL scancodes to machine button IDs.
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a machine button ID.
    pub fn bind(&mut self, scancode: Scancode, button_id: u8) {
        self.map.insert(scancode, button_id);
    }

    /// Look up the machine button ID for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the default key map for the cabinet's input buttons.
pub fn default_key_map(buttons: &[InputButton]) -> KeyMap {
    let mut km = KeyMap::new();

    for button in buttons {
        let scancode = match button.name {
            "Coin" => Some(Scancode::Num5),
            "P1 Start" => Some(Scancode::Num1),
            "P2 Start" => Some(Scancode::Num2),
            "P1 Fire" => Some(Scancode::LCtrl),
            "P1 Left" => Some(Scancode::Left),
            "P1 Right" => Some(Scancode::Right),
            "P2 Fire" => Some(Scancode::E),
            "P2 Left" => Some(Scancode::A),
            "P2 Right" => Some(Scancode::D),
            "Tilt" => Some(Scancode::T),
            _ => None,
        };

        if let Some(sc) = scancode {
            km.bind(sc, button.id);
        }
    }

    km
}
