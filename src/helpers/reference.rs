/// Converts a 0-based column index to Excel-style column letters ("A", "Z", "AA").
pub(crate) fn column_name(column: usize) -> String {
    let mut column = column + 1;
    let mut name = String::new();
    while column > 0 {
        column -= 1;
        name.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    name
}

/// Convert 0-based row & column indexes to Excel-style cell position.
///
/// # Arguments
///
/// * `row` - The 0-based row index
/// * `column` - The 0-based column index
///
/// # Returns
///
/// * `String` - Excel-style cell position in upper case, e.g. "B3"
pub(crate) fn cell_position(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn positions() {
        assert_eq!(cell_position(0, 0), "A1");
        assert_eq!(cell_position(2, 1), "B3");
    }
}
