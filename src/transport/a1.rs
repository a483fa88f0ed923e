//! A1 notation helpers for spreadsheet ranges

/// Bijective base-26 column name: 1 -> A, 26 -> Z, 27 -> AA
pub fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Worksheet name quoted for use in a range ('It''s' for It's)
pub fn quote_sheet_name(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Range covering the whole worksheet
pub fn sheet_range(worksheet: &str) -> String {
    quote_sheet_name(worksheet)
}

/// Range covering one entire row
pub fn row_range(worksheet: &str, row: usize) -> String {
    format!("{}!{row}:{row}", quote_sheet_name(worksheet))
}

/// Range for a single cell
pub fn cell_range(worksheet: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quote_sheet_name(worksheet), column_letters(col), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "A")]
    #[case(5, "E")]
    #[case(26, "Z")]
    #[case(27, "AA")]
    #[case(52, "AZ")]
    #[case(702, "ZZ")]
    #[case(703, "AAA")]
    fn test_column_letters(#[case] col: usize, #[case] expected: &str) {
        assert_eq!(column_letters(col), expected);
    }

    #[test]
    fn test_ranges_quote_sheet_names() {
        assert_eq!(cell_range("Customers", 3, 2), "'Customers'!B3");
        assert_eq!(row_range("sheet1", 1), "'sheet1'!1:1");
        assert_eq!(sheet_range("It's"), "'It''s'");
    }

    proptest! {
        #[test]
        fn test_column_letters_strictly_ordered(col in 1usize..20_000) {
            let a = column_letters(col);
            let b = column_letters(col + 1);
            prop_assert!(a.chars().all(|c| c.is_ascii_uppercase()));
            prop_assert!((a.len(), a.as_str()) < (b.len(), b.as_str()));
        }
    }
}
