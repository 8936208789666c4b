/*
 * This module derives canonical search keys from game titles so they can be
 * matched case-insensitively against profile catalog entries. Titles are
 * human-authored and arrive in mixed casing ("CounterStrike", "HalfLife2",
 * "DOOM Eternal"), so the normalizer segments words at case transitions
 * before lowercasing, without relying on any dictionary.
 */

/*
 * Normalizes a title into its search key. Pure and total: any input string,
 * including the empty string, produces a result deterministically.
 *
 * Word boundaries are inserted between a lowercase letter and a following
 * uppercase letter or digit, and between a digit and a following uppercase
 * letter. Digit runs are never split, so "GTA5" stays one word while
 * "HalfLife2" becomes three. The result is whitespace-collapsed and
 * lowercased.
 */
pub fn normalize_title(title: &str) -> String {
    let mut segmented = String::with_capacity(title.len() + 8);
    let mut previous: Option<char> = None;
    for current in title.chars() {
        if let Some(prev) = previous {
            let case_boundary = prev.is_lowercase() && (current.is_uppercase() || current.is_ascii_digit());
            let digit_boundary = prev.is_ascii_digit() && current.is_uppercase();
            if case_boundary || digit_boundary {
                segmented.push(' ');
            }
        }
        segmented.push(current);
        previous = Some(current);
    }

    let collapsed: Vec<&str> = segmented.split_whitespace().collect();
    collapsed.join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_is_segmented() {
        assert_eq!(normalize_title("CounterStrike"), "counter strike");
    }

    #[test]
    fn test_trailing_digit_is_segmented() {
        assert_eq!(normalize_title("HalfLife2"), "half life 2");
    }

    #[test]
    fn test_uppercase_abbreviation_keeps_digit_attached() {
        // No lowercase→digit transition, so nothing fires.
        assert_eq!(normalize_title("GTA5"), "gta5");
    }

    #[test]
    fn test_plain_words_are_only_lowercased() {
        assert_eq!(normalize_title("DOOM Eternal"), "doom eternal");
        assert_eq!(normalize_title("already lower"), "already lower");
    }

    #[test]
    fn test_digit_followed_by_uppercase_is_segmented() {
        assert_eq!(normalize_title("Left4Dead"), "left 4 dead");
    }

    #[test]
    fn test_digit_runs_are_never_split() {
        assert_eq!(normalize_title("Train2077"), "train 2077");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(normalize_title("  Half-Life   2  "), "half-life 2");
        assert_eq!(normalize_title("Tab\tand\nnewline"), "tab and newline");
    }

    #[test]
    fn test_empty_input_yields_empty_key() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("   "), "");
    }

    #[test]
    fn test_deterministic() {
        let title = "SomeGame2Remastered";
        assert_eq!(normalize_title(title), normalize_title(title));
        assert_eq!(normalize_title(title), "some game 2 remastered");
    }
}
