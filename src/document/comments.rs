/// Where the content loaded before a key ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preceding {
    /// Last source line (1-based) taken by a previously loaded scalar.
    pub floor: usize,
    /// Whether that scalar was a `|` or `>` block.
    pub block_scalar: bool,
}

/// Recover the head comment of a node that starts on `line` (1-based) at
/// `column` (0-based).
///
/// Walks upward from the line above the node, collecting comment lines and
/// interior blank lines until a content line is hit. Indentation is removed,
/// comment text is otherwise kept verbatim, and blank lines stay in the
/// block as empty lines. The walk never reaches `preceding.floor`, and after
/// a block scalar, lines indented deeper than the node are scalar content.
///
/// A node that shares its line with other content (e.g. a key inside a
/// one-line flow mapping) has no head comment.
pub fn head_comment(lines: &[&str], line: usize, column: usize, preceding: Preceding) -> String {
    if !starts_its_line(lines, line, column) {
        return String::new();
    }

    let mut block: Vec<&str> = Vec::new();
    let mut idx = line.saturating_sub(1);
    while idx > preceding.floor {
        idx -= 1;
        let Some(raw) = lines.get(idx) else { break };
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let trimmed = raw.trim_start();
        let indent = raw.len() - trimmed.len();

        if trimmed.is_empty() {
            if block.is_empty() {
                // detached comment
                break;
            }
            block.push("");
            continue;
        }
        if !trimmed.starts_with('#') {
            break;
        }
        if preceding.block_scalar && indent > column {
            break;
        }
        block.push(trimmed);
    }

    while block.last() == Some(&"") {
        block.pop();
    }
    block.reverse();
    block.join("\n")
}

/// Only indentation and sequence dashes come before `column` on `line`.
fn starts_its_line(lines: &[&str], line: usize, column: usize) -> bool {
    let Some(text) = line.checked_sub(1).and_then(|idx| lines.get(idx)) else {
        return true;
    };
    text.chars()
        .take(column)
        .all(|c| matches!(c, ' ' | '\t' | '-'))
}

/// Last line (1-based) of a quoted scalar whose opening `quote` is at or
/// after `column` on `line`.
pub fn quoted_scalar_end(lines: &[&str], line: usize, column: usize, quote: char) -> usize {
    let mut opened = false;
    for (idx, text) in lines.iter().enumerate().skip(line.saturating_sub(1)) {
        let skip = if idx + 1 == line { column } else { 0 };
        let mut escaped = false;
        let mut chars = text.chars().skip(skip).peekable();
        while let Some(c) = chars.next() {
            if !opened {
                opened = c == quote;
                continue;
            }
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if quote == '"' => escaped = true,
                '\'' if quote == '\'' && chars.peek() == Some(&'\'') => {
                    chars.next();
                }
                c if c == quote => return idx + 1,
                _ => {}
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &str) -> Vec<&str> {
        src.lines().collect()
    }

    fn after(floor: usize) -> Preceding {
        Preceding { floor, block_scalar: false }
    }

    #[test]
    fn collects_adjacent_comment_block() {
        let src = "a: 1\n# one\n# two\nfoo: bar\n";
        assert_eq!(head_comment(&lines(src), 4, 0, after(1)), "# one\n# two");
    }

    #[test]
    fn keeps_interior_blank_lines_and_drops_leading_ones() {
        let src = "\n\n# intro\n\n# default: 1\nfoo: 1\n";
        assert_eq!(head_comment(&lines(src), 6, 0, Preceding::default()), "# intro\n\n# default: 1");
    }

    #[test]
    fn detached_comment_is_not_a_head_comment() {
        let src = "# floating\n\nfoo: bar\n";
        assert_eq!(head_comment(&lines(src), 3, 0, Preceding::default()), "");
    }

    #[test]
    fn strips_indentation_of_nested_comments() {
        let src = "outer:\n    # inner doc\n    inner: 1\n";
        assert_eq!(head_comment(&lines(src), 3, 4, after(1)), "# inner doc");
    }

    #[test]
    fn keeps_malformed_prefix_verbatim() {
        let src = "#no-space\nfoo: bar\n";
        assert_eq!(head_comment(&lines(src), 2, 0, Preceding::default()), "#no-space");
    }

    #[test]
    fn block_scalar_content_is_not_a_comment() {
        let src = "script: |\n  # not a comment\n# real\nnext: 1\n";
        let preceding = Preceding { floor: 1, block_scalar: true };
        assert_eq!(head_comment(&lines(src), 4, 0, preceding), "# real");
    }

    #[test]
    fn first_line_has_no_comment() {
        assert_eq!(head_comment(&lines("foo: bar\n"), 1, 0, Preceding::default()), "");
    }

    #[test]
    fn key_sharing_its_line_has_no_comment() {
        let src = "# doc\nimage: {repository: nginx}\n";
        assert_eq!(head_comment(&lines(src), 2, 8, after(2)), "");
        assert_eq!(head_comment(&lines(src), 2, 0, Preceding::default()), "# doc");
    }

    #[test]
    fn sequence_item_key_keeps_its_comment() {
        let src = "hosts:\n  # primary\n  - name: a\n";
        assert_eq!(head_comment(&lines(src), 3, 4, after(1)), "# primary");
    }

    #[test]
    fn walk_stops_at_floor() {
        let src = "a: \"x\n  # inside\"\nb: 1\n";
        assert_eq!(head_comment(&lines(src), 3, 0, after(2)), "");
    }

    #[test]
    fn finds_end_of_quoted_scalars() {
        let src = lines("a: \"hello\n  # world\"\nb: 'it''s\n  # x'\nc: \"one \\\" line\"\n");
        assert_eq!(quoted_scalar_end(&src, 1, 3, '"'), 2);
        assert_eq!(quoted_scalar_end(&src, 3, 3, '\''), 4);
        assert_eq!(quoted_scalar_end(&src, 5, 3, '"'), 5);
    }
}
