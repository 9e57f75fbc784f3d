use crate::options::Grid;
use anyhow::Result;
use gridid::GridEncoder;

impl Grid {
    pub fn run(&self) -> Result<()> {
        let grid = GridEncoder::with_layout(self.base.into(), self.layout);
        let code = grid.encode(self.lon, self.lat)?;
        let bounds = grid.bounds(code.as_str())?;
        let (min, max) = (bounds.min(), bounds.max());
        println!("{code} {} {} {} {}", min.x, min.y, max.x, max.y);
        Ok(())
    }
}
