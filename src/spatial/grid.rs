//! Dense row-major grid addressed by signed tile coordinates

use serde::{Deserialize, Serialize};

/// Fixed-size 2D grid; coordinates outside `[0, width) x [0, height)` read as absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridCells<T>")]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Serialized form, checked against its dimensions on load
#[derive(Deserialize)]
struct GridCells<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> TryFrom<GridCells<T>> for Grid<T> {
    type Error = String;

    fn try_from(cells: GridCells<T>) -> Result<Self, Self::Error> {
        let (width, height, len) = (cells.width, cells.height, cells.data.len());
        Grid::from_cells(width, height, cells.data)
            .ok_or_else(|| format!("{}x{} grid holds {} cells", width, height, len))
    }
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Build from row-major cells; `None` if the length does not match
    pub fn from_cells(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (width.checked_mul(height) == Some(data.len())).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y).then(|| y as usize * self.width + x as usize)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        let i = self.index(x, y)?;
        Some(&self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        let i = self.index(x, y)?;
        Some(&mut self.data[i])
    }

    /// Iterate `(x, y, cell)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i % width) as i32, (i / width) as i32, cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (i32, i32, &mut T)> {
        let width = self.width;
        self.data
            .iter_mut()
            .enumerate()
            .map(move |(i, cell)| ((i % width) as i32, (i / width) as i32, cell))
    }

    /// Clamp a coordinate pair into the grid
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.clamp(0, self.width as i32 - 1),
            y.clamp(0, self.height as i32 - 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_none() {
        let grid: Grid<u8> = Grid::new(4, 3);
        assert!(grid.get(0, 0).is_some());
        assert!(grid.get(3, 2).is_some());
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 3).is_none());
        assert!(grid.get(-1, 0).is_none());
    }

    #[test]
    fn test_row_major_iteration() {
        let mut grid: Grid<u32> = Grid::new(3, 2);
        *grid.get_mut(2, 1).unwrap() = 7;
        let cells: Vec<_> = grid.iter().map(|(x, y, v)| (x, y, *v)).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[5], (2, 1, 7));
        assert_eq!(cells[1], (1, 0, 0));
    }

    #[test]
    fn test_from_cells_checks_length() {
        assert!(Grid::from_cells(2, 2, vec![1, 2, 3]).is_none());
        let grid = Grid::from_cells(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(grid.get(1, 1), Some(&4));
    }

    #[test]
    fn test_deserialize_rejects_short_data() {
        assert!(serde_json::from_str::<Grid<u8>>(r#"{"width":4,"height":4,"data":[1,2,3]}"#).is_err());
        let grid: Grid<u8> =
            serde_json::from_str(r#"{"width":2,"height":1,"data":[5,6]}"#).unwrap();
        assert_eq!(grid.get(1, 0), Some(&6));
    }

    #[test]
    fn test_clamp() {
        let grid: Grid<u8> = Grid::new(5, 5);
        assert_eq!(grid.clamp(-3, 9), (0, 4));
    }
}
