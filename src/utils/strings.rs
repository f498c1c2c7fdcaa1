use itertools::Itertools;

/// Cleans up a parsed game title, removing trademark glyphs
pub fn clean_game_title(title: impl AsRef<str>) -> String {
    title.as_ref().replace(['™', '®'], "").trim().to_owned()
}

/// Turns a raw folder or registry key name into a display title
///
/// Underscores and dots become spaces, trademark markers are removed and whitespace is collapsed.
pub fn clean_folder_name(folder_name: impl AsRef<str>) -> String {
    let without_separators = folder_name.as_ref().replace(['_', '.'], " ");
    let without_marks = remove_ascii_case_insensitive(&without_separators, "(tm)");

    clean_game_title(without_marks)
        .split_whitespace()
        .join(" ")
}

/// Splits a `CamelCase` package-style folder name into words, e.g. `ForzaHorizon5` -> `Forza Horizon5`
pub fn split_camel_case(folder_name: impl AsRef<str>) -> String {
    let mut spaced = String::new();
    for c in folder_name.as_ref().chars() {
        if c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }

    spaced.replace(['_', '-'], " ").split_whitespace().join(" ")
}

/// Builds the name part of a game ID: whitespace becomes `_`, anything else non-alphanumeric is
/// dropped
pub fn get_id_slug(name: impl AsRef<str>) -> String {
    name.as_ref()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Whether `haystack` contains any of the (lowercase) `needles`, ignoring case
pub fn contains_any_ignore_case(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Removes every occurrence of an ASCII `pattern`, ignoring case
fn remove_ascii_case_insensitive(input: &str, pattern: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with the original string
    let lowered = input.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    for (start, _) in lowered.match_indices(&pattern) {
        output.push_str(&input[last..start]);
        last = start + pattern.len();
    }
    output.push_str(&input[last..]);

    output
}

#[cfg(test)]
pub mod test {
    use test_case::test_case;

    use super::*;

    #[test_case("Soon™", "Soon")]
    #[test_case("Game®", "Game")]
    #[test_case("®T™i®t™l®e™", "Title")]
    #[test_case("L.A. Noire", "L.A. Noire")]
    fn test_clean_game_title(dirty: &str, clean: &str) {
        assert_eq!(clean_game_title(dirty), String::from(clean));
    }

    #[test_case("Battlefield 2042", "Battlefield 2042")]
    #[test_case("Assassins_Creed_Valhalla", "Assassins Creed Valhalla")]
    #[test_case("Far.Cry.6", "Far Cry 6")]
    #[test_case("Mass Effect(TM)  Legendary   Edition", "Mass Effect Legendary Edition")]
    #[test_case("Anno 1800™ ", "Anno 1800")]
    #[test_case("  Dead_Space(tm)", "Dead Space")]
    fn test_clean_folder_name(dirty: &str, clean: &str) {
        assert_eq!(clean_folder_name(dirty), clean);
    }

    #[test_case("ForzaHorizon5", "Forza Horizon5")]
    #[test_case("Microsoft_Flight-Simulator", "Microsoft Flight Simulator")]
    fn test_split_camel_case(raw: &str, expected: &str) {
        assert_eq!(split_camel_case(raw), expected);
    }

    #[test_case("Battlefield 2042", "Battlefield_2042")]
    #[test_case("Tom Clancy's Rainbow Six: Siege", "Tom_Clancys_Rainbow_Six_Siege")]
    #[test_case("L.A. Noire", "LA_Noire")]
    #[test_case("ファークライ", "ファークライ")]
    #[test_case("アサシン クリード", "アサシン_クリード")]
    #[test_case("Pokémon", "Pokémon")]
    fn test_get_id_slug(name: &str, expected: &str) {
        assert_eq!(get_id_slug(name), expected);
    }

    #[test]
    fn test_contains_any_ignore_case() {
        assert!(contains_any_ignore_case("Far Cry 6", &["far cry"]));
        assert!(!contains_any_ignore_case("Terraria", &["far cry", "anno"]));
    }
}
