//! Voice filter presets
//!
//! A preset is an immutable bundle of stage parameters, identified by its
//! name. Applying one copies its values into the graph; the preset itself
//! never changes.

/// Distortion stage parameters: pre-gain in dB ahead of the waveshaper,
/// plus wet/dry mix as a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    pub pre_gain_db: f32,
    /// 0 = fully dry, 100 = fully wet
    pub mix: f32,
}

/// A named voice filter: one value per graph stage.
///
/// Equality is keyed on the name alone, so a renamed copy with identical
/// parameters is a different preset and an edited copy with the same name
/// is still "the same" one.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    /// Reverb wet/dry mix percentage. Values above 100 are clamped by the
    /// stage on apply; the stored value stays as declared.
    pub reverb_mix: f32,
    /// Pitch shift in cents (100 cents = 1 semitone).
    pub pitch_cents: f32,
    /// Playback rate multiplier. Resampling varispeed: pitch follows.
    pub speed: f32,
    pub distortion: DistortionParams,
}

impl PartialEq for Preset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Preset {}

impl Default for Preset {
    fn default() -> Self {
        CLEAR
    }
}

/// Neutral pass-through: every stage at its transparent setting.
pub const CLEAR: Preset = Preset {
    name: "clear",
    reverb_mix: 0.0,
    pitch_cents: 0.0,
    speed: 1.0,
    distortion: DistortionParams {
        pre_gain_db: -6.0,
        mix: 0.0,
    },
};

/// Five semitones down.
pub const MAN: Preset = Preset {
    name: "man",
    reverb_mix: 0.0,
    pitch_cents: -500.0,
    speed: 1.0,
    distortion: DistortionParams {
        pre_gain_db: -6.0,
        mix: 0.0,
    },
};

/// Low growl: full reverb, downshift, a touch of overdrive.
pub const MONSTER: Preset = Preset {
    name: "monster",
    reverb_mix: 100.0,
    pitch_cents: -500.0,
    speed: 1.0,
    distortion: DistortionParams {
        pre_gain_db: 10.0,
        mix: 10.0,
    },
};

/// Five semitones up.
pub const GIRL: Preset = Preset {
    name: "girl",
    reverb_mix: 0.0,
    pitch_cents: 500.0,
    speed: 1.0,
    distortion: DistortionParams {
        pre_gain_db: -6.0,
        mix: 0.0,
    },
};

/// Oversized room. The mix is declared past the stage range on purpose;
/// it pins the reverb fully wet.
pub const HALL: Preset = Preset {
    name: "hall",
    reverb_mix: 500.0,
    pitch_cents: 0.0,
    speed: 1.0,
    distortion: DistortionParams {
        pre_gain_db: -6.0,
        mix: 0.0,
    },
};

/// The built-in catalog, in display order.
pub static BUILT_IN: [Preset; 5] = [CLEAR, MAN, MONSTER, GIRL, HALL];

/// Look up a built-in preset by name.
pub fn find(name: &str) -> Option<&'static Preset> {
    BUILT_IN.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_values() {
        assert_eq!(CLEAR.name, "clear");
        assert_eq!(CLEAR.reverb_mix, 0.0);
        assert_eq!(CLEAR.pitch_cents, 0.0);
        assert_eq!(CLEAR.speed, 1.0);
        assert_eq!(CLEAR.distortion.pre_gain_db, -6.0);
        assert_eq!(CLEAR.distortion.mix, 0.0);
    }

    #[test]
    fn test_man_values() {
        assert_eq!(MAN.pitch_cents, -500.0);
        assert_eq!(MAN.reverb_mix, 0.0);
        assert_eq!(MAN.speed, 1.0);
        assert_eq!(MAN.distortion.pre_gain_db, -6.0);
        assert_eq!(MAN.distortion.mix, 0.0);
    }

    #[test]
    fn test_monster_values() {
        assert_eq!(MONSTER.reverb_mix, 100.0);
        assert_eq!(MONSTER.pitch_cents, -500.0);
        assert_eq!(MONSTER.speed, 1.0);
        assert_eq!(MONSTER.distortion.pre_gain_db, 10.0);
        assert_eq!(MONSTER.distortion.mix, 10.0);
    }

    #[test]
    fn test_girl_values() {
        assert_eq!(GIRL.pitch_cents, 500.0);
        assert_eq!(GIRL.reverb_mix, 0.0);
        assert_eq!(GIRL.speed, 1.0);
        assert_eq!(GIRL.distortion.mix, 0.0);
    }

    #[test]
    fn test_hall_keeps_declared_overrange_mix() {
        assert_eq!(HALL.reverb_mix, 500.0);
        assert_eq!(HALL.pitch_cents, 0.0);
        assert_eq!(HALL.speed, 1.0);
    }

    #[test]
    fn test_equality_is_name_keyed() {
        let mut edited = MONSTER;
        edited.reverb_mix = 0.0;
        edited.pitch_cents = 0.0;
        assert_eq!(edited, MONSTER);

        let mut renamed = CLEAR;
        renamed.name = "not clear";
        assert_ne!(renamed, CLEAR);
    }

    #[test]
    fn test_find_resolves_all_built_ins() {
        for preset in &BUILT_IN {
            let found = find(preset.name).unwrap();
            assert_eq!(found.name, preset.name);
        }
        assert!(find("cathedral").is_none());
    }

    #[test]
    fn test_default_is_clear() {
        let d = Preset::default();
        assert_eq!(d, CLEAR);
        assert_eq!(d.speed, CLEAR.speed);
        assert_eq!(d.distortion.pre_gain_db, CLEAR.distortion.pre_gain_db);
    }
}
