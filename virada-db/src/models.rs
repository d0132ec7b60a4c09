use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const POOL_SIZE: u8 = 60;
pub const DRAW_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub contest: Option<u32>,
    pub date: Option<String>,
    pub numbers: [u8; DRAW_SIZE],
}

impl Draw {
    pub fn new(
        contest: Option<u32>,
        date: Option<String>,
        mut numbers: [u8; DRAW_SIZE],
    ) -> Result<Draw> {
        numbers.sort_unstable();
        validate_numbers(&numbers)?;
        Ok(Draw {
            contest,
            date,
            numbers,
        })
    }
}

pub fn validate_numbers(numbers: &[u8; DRAW_SIZE]) -> Result<()> {
    for &d in numbers {
        if d < 1 || d > POOL_SIZE {
            bail!("Dezena {} fora do intervalo (1-60)", d);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Dezena em duplicidade: {}", numbers[i]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_numbers_ok() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6]).is_ok());
        assert!(validate_numbers(&[55, 56, 57, 58, 59, 60]).is_ok());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert!(validate_numbers(&[0, 2, 3, 4, 5, 6]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 61]).is_err());
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        assert!(validate_numbers(&[1, 1, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_new_sorts_ascending() {
        let draw = Draw::new(Some(100), None, [56, 5, 45, 12, 34, 23]).unwrap();
        assert_eq!(draw.numbers, [5, 12, 23, 34, 45, 56]);
    }

    #[test]
    fn test_new_rejects_duplicate() {
        assert!(Draw::new(None, None, [5, 5, 23, 34, 45, 56]).is_err());
    }
}
