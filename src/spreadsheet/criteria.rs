use glob::Pattern;

/// Selects which worksheet of a workbook is read.
#[derive(Clone, Debug, Default)]
pub(crate) struct Criteria {
    /// Sheet name patterns; `None` selects the first worksheet.
    pub(crate) sheet_name_patterns: Option<Vec<Pattern>>,
}

impl Criteria {
    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }

    /// Human-readable description used in "sheet not found" errors.
    pub(crate) fn describe(&self) -> String {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().map(Pattern::as_str).collect::<Vec<_>>().join(", "),
            None => "<first sheet>".to_owned(),
        }
    }
}
