//! Static per-state climate and geography table.
//!
//! The generator draws coordinates and climate perturbations around these
//! baselines; the prediction service uses the same baselines to fill in the
//! climate features a request does not carry.

/// Typical climate of a region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    /// Average temperature in degrees Celsius
    pub avg_temperature: f64,
    /// Annual rainfall in millimetres
    pub annual_rainfall: f64,
}

/// Climate used for any state missing from [`STATES`]
pub const DEFAULT_CLIMATE: Climate = Climate {
    avg_temperature: 25.0,
    annual_rainfall: 700.0,
};

/// A known state with its bounding box and climate baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateProfile {
    pub name: &'static str,
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
    pub climate: Climate,
}

/// Known states, in generator draw order.
pub static STATES: [StateProfile; 5] = [
    StateProfile {
        name: "Punjab",
        lat_range: (30.0, 31.5),
        lon_range: (74.0, 76.0),
        climate: Climate {
            avg_temperature: 25.0,
            annual_rainfall: 650.0,
        },
    },
    StateProfile {
        name: "Haryana",
        lat_range: (28.5, 30.5),
        lon_range: (76.0, 77.5),
        climate: Climate {
            avg_temperature: 26.0,
            annual_rainfall: 600.0,
        },
    },
    StateProfile {
        name: "Uttar Pradesh",
        lat_range: (25.0, 28.0),
        lon_range: (80.0, 83.0),
        climate: Climate {
            avg_temperature: 27.0,
            annual_rainfall: 900.0,
        },
    },
    StateProfile {
        name: "Maharashtra",
        lat_range: (18.0, 20.0),
        lon_range: (73.0, 75.0),
        climate: Climate {
            avg_temperature: 28.0,
            annual_rainfall: 1000.0,
        },
    },
    StateProfile {
        name: "West Bengal",
        lat_range: (22.0, 24.0),
        lon_range: (87.0, 89.0),
        climate: Climate {
            avg_temperature: 29.0,
            annual_rainfall: 1500.0,
        },
    },
];

/// Look up a state by exact (case-sensitive) name
pub fn state_profile(name: &str) -> Option<&'static StateProfile> {
    STATES.iter().find(|profile| profile.name == name)
}

/// Climate baseline for a state, falling back to [`DEFAULT_CLIMATE`]
pub fn climate_for_state(name: &str) -> Climate {
    state_profile(name)
        .map(|profile| profile.climate)
        .unwrap_or(DEFAULT_CLIMATE)
}
