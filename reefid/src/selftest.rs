use anyhow::{bail, Result};
use gridid::{Base, GridEncoder, GridLayout};

/// `(base, layout, lon, lat, expected code)`.
const CASES: [(Base, GridLayout, f64, f64, &str); 4] = [
    (Base::B32Caps, GridLayout::Nested, 147.0, -20.0, "XE4G"),
    (Base::B32Caps, GridLayout::Axis, 147.0, -20.0, "X4EG"),
    (Base::B10, GridLayout::Axis, 147.0, -20.0, "9038"),
    (Base::B10, GridLayout::Axis, 149.0, -17.0, "9140"),
];

pub fn run() -> Result<()> {
    println!("Running tests...");
    for (base, layout, lon, lat, expected) in CASES {
        let code = GridEncoder::with_layout(base.into(), layout).encode(lon, lat)?;
        if code.as_str() != expected {
            bail!("test failed for ({lon}, {lat}) {base} {layout}: expected {expected}, got {code}");
        }
    }
    println!("All tests passed!");
    Ok(())
}
