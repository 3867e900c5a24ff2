use serde::Deserialize;

/// Injectable thresholds and lookup tables for the rule layers. Every
/// field has a default, so a TOML override file only needs to name what
/// it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Statement-line count above which a script is reported as too long.
    pub long_script_lines: usize,
    /// Statement-line count from which a target is expected to carry at
    /// least one comment.
    pub comment_required_lines: usize,
    /// Default sprite names in the editor's supported locales; a sprite
    /// name containing one of these produces a naming warning.
    pub standard_sprite_names: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            long_script_lines: 80,
            comment_required_lines: 20,
            standard_sprite_names: STANDARD_SPRITE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Editor default sprite names across locales (list originally compiled
/// by the LitterBox project).
const STANDARD_SPRITE_NAMES: &[&str] = &[
    "Actor",
    "Ator",
    "Ciplun",
    "Duszek",
    "Figur",
    "Figura",
    "Gariņš",
    "Hahmo",
    "Kihusika",
    "Kukla",
    "Lik",
    "Nhân",
    "Objeto",
    "Parehe",
    "Personaj",
    "Personatge",
    "Pertsonaia",
    "Postava",
    "Pêlîstik",
    "Sprait",
    "Sprajt",
    "Sprayt",
    "Sprid",
    "Sprite",
    "Sprìd",
    "Szereplő",
    "Teikning",
    "Umlingisi",
    "Veikėjas",
    "Αντικείμενο",
    "Анагӡаҩ",
    "Дүрс",
    "Лик",
    "Спрайт",
    "Կերպար",
    "דמות",
    "الكائن",
    "تەن",
    "شکلک",
    "สไปรต์",
    "სპრაიტი",
    "ገፀ-ባህርይ",
    "តួអង្គ",
    "スプライト",
    "角色",
    "스프라이트",
];
