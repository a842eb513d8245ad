use crate::map::Rgb;

/// Braille Unicode canvas with a depth buffer and one color per cell.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    pixels: Vec<Vec<u8>>, // Bit patterns per char
    /// NDC depth per dot, row-major over width*2 x height*4
    depth: Vec<f64>,
    /// Color of the nearest dot per char
    colors: Vec<Vec<Option<(Rgb, f64)>>>,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![vec![0u8; width]; height],
            depth: vec![f64::INFINITY; width * 2 * height * 4],
            colors: vec![vec![None; width]; height],
        }
    }

    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    fn bit(x: usize, y: usize) -> u8 {
        match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        }
    }

    /// Depth-tested write. `lit` decides whether the dot is raised; an
    /// unlit sample still occludes whatever was behind it.
    /// Returns true when the sample passed the depth test.
    pub fn plot(&mut self, x: i32, y: i32, depth: f64, lit: bool, color: Rgb) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return false;
        }

        let idx = y * self.pixel_width() + x;
        if depth >= self.depth[idx] {
            return false;
        }
        self.depth[idx] = depth;

        let bit = Self::bit(x, y);
        if lit {
            self.pixels[cy][cx] |= bit;
            let nearer = self.colors[cy][cx].is_none_or(|(_, d)| depth <= d);
            if nearer {
                self.colors[cy][cx] = Some((color, depth));
            }
        } else {
            self.pixels[cy][cx] &= !bit;
        }
        true
    }

    pub fn cell_color(&self, col: usize, row: usize) -> Option<Rgb> {
        self.colors.get(row)?.get(col)?.map(|(c, _)| c)
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|i| self.row_to_string(i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get a specific row as a string (for line-by-line rendering)
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.pixels[row]
            .iter()
            .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
            .collect()
    }

    /// Get all rows as an iterator of strings
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }
}
