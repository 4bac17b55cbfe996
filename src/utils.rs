/// Calculates the 1-based line and column number for a given byte position in the source text.
/// Columns count characters, not bytes. Only called when an error is being built.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::get_line_and_column;

    #[test]
    fn test_first_position() {
        assert_eq!(get_line_and_column("abc", 0), (1, 1));
    }

    #[test]
    fn test_after_newlines() {
        let source = "a <- 1;\nbegin\n  x := !;\nend";
        let pos = source.find('!').unwrap();
        assert_eq!(get_line_and_column(source, pos), (3, 8));
    }

    #[test]
    fn test_multibyte_characters_count_once() {
        let source = "@\"ключ\" ?";
        let pos = source.find('?').unwrap();
        assert_eq!(get_line_and_column(source, pos), (1, 9));
    }
}
