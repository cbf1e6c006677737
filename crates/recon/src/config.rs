use serde::Deserialize;

use crate::error::ReconError;
use crate::matcher::MatchOptions;
use crate::model::TaxField;
use crate::scorer::ScorerKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Contents of a `gstmatch.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_auto_confirm")]
    pub auto_confirm: u8,
    #[serde(default)]
    pub scorer: ScorerKind,
}

fn default_threshold() -> u8 {
    80
}

fn default_auto_confirm() -> u8 {
    90
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            auto_confirm: default_auto_confirm(),
            scorer: ScorerKind::default(),
        }
    }
}

impl MatchingConfig {
    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.threshold,
            auto_confirm: self.auto_confirm,
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names looked up (case-insensitively) on both sides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    pub supplier_name: String,
    pub gstin: String,
    pub invoice_number: String,
    pub taxable_value: String,
    pub integrated_tax: String,
    pub central_tax: String,
    pub state_tax: String,
    pub cess: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            supplier_name: "Supplier".into(),
            gstin: "GSTIN of supplier".into(),
            invoice_number: "Invoice number".into(),
            taxable_value: "Taxable Value".into(),
            integrated_tax: "Integrated Tax".into(),
            central_tax: "Central Tax".into(),
            state_tax: "State/UT tax".into(),
            cess: "Cess".into(),
        }
    }
}

impl ColumnConfig {
    pub fn amount_column(&self, field: TaxField) -> &str {
        match field {
            TaxField::TaxableValue => &self.taxable_value,
            TaxField::IntegratedTax => &self.integrated_tax,
            TaxField::CentralTax => &self.central_tax,
            TaxField::StateTax => &self.state_tax,
            TaxField::Cess => &self.cess,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile + Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Fields compared per entity.
    #[serde(default = "default_fields")]
    pub fields: Vec<TaxField>,
    /// Field whose nonzero sum marks a side as present.
    #[serde(default = "default_primary")]
    pub primary: TaxField,
}

fn default_fields() -> Vec<TaxField> {
    vec![
        TaxField::IntegratedTax,
        TaxField::CentralTax,
        TaxField::StateTax,
        TaxField::Cess,
    ]
}

fn default_primary() -> TaxField {
    TaxField::IntegratedTax
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            primary: default_primary(),
        }
    }
}

/// Where ledgers live inside a single workbook.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub books_sheet: String,
    pub returns_sheet: String,
    /// 1-based spreadsheet row holding the headers.
    pub header_row: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            books_sheet: "Tally".into(),
            returns_sheet: "GSTR-2A".into(),
            header_row: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let m = &self.matching;
        if m.threshold > 100 {
            return Err(ReconError::validation(format!(
                "matching.threshold must be 0-100, got {}",
                m.threshold
            )));
        }
        if m.auto_confirm > 100 || m.auto_confirm < m.threshold {
            return Err(ReconError::validation(format!(
                "matching.auto_confirm must be between threshold ({}) and 100, got {}",
                m.threshold, m.auto_confirm
            )));
        }

        if self.columns.supplier_name.trim().is_empty() {
            return Err(ReconError::validation("columns.supplier_name must not be empty"));
        }

        let r = &self.reconcile;
        if r.fields.is_empty() {
            return Err(ReconError::validation("reconcile.fields must list at least one field"));
        }
        if !r.fields.contains(&r.primary) {
            return Err(ReconError::validation(format!(
                "reconcile.primary '{}' is not one of reconcile.fields",
                r.primary
            )));
        }

        if self.source.header_row == 0 {
            return Err(ReconError::validation("source.header_row is 1-based and must be at least 1"));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config, ReconConfig::default());
        assert_eq!(config.matching.threshold, 80);
        assert_eq!(config.matching.auto_confirm, 90);
        assert_eq!(config.matching.scorer, ScorerKind::Ratio);
        assert_eq!(config.source.books_sheet, "Tally");
        assert_eq!(config.source.returns_sheet, "GSTR-2A");
        assert_eq!(config.source.header_row, 2);
        assert_eq!(config.reconcile.primary, TaxField::IntegratedTax);
    }

    #[test]
    fn parse_full() {
        let input = r#"
[matching]
threshold = 70
auto_confirm = 85
scorer = "token_sort"

[columns]
supplier_name = "Party Name"
gstin = "GSTIN/UIN"

[reconcile]
fields = ["taxable_value", "integrated_tax"]
primary = "taxable_value"

[source]
books_sheet = "Purchases"
header_row = 1
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.matching.threshold, 70);
        assert_eq!(config.matching.scorer, ScorerKind::TokenSort);
        assert_eq!(config.columns.supplier_name, "Party Name");
        // Unset columns keep their defaults.
        assert_eq!(config.columns.cess, "Cess");
        assert_eq!(config.reconcile.fields.len(), 2);
        assert_eq!(config.source.books_sheet, "Purchases");
        assert_eq!(config.source.returns_sheet, "GSTR-2A");
    }

    #[test]
    fn rejects_auto_confirm_below_threshold() {
        let err = ReconConfig::from_toml("[matching]\nthreshold = 90\nauto_confirm = 80\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_threshold_over_100() {
        let err = ReconConfig::from_toml("[matching]\nthreshold = 101\nauto_confirm = 101\n").unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn rejects_primary_outside_fields() {
        let input = "[reconcile]\nfields = [\"cess\"]\nprimary = \"integrated_tax\"\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("reconcile.primary"));
    }

    #[test]
    fn rejects_blank_supplier_column() {
        let err = ReconConfig::from_toml("[columns]\nsupplier_name = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("supplier_name"));
    }

    #[test]
    fn rejects_zero_header_row() {
        assert!(ReconConfig::from_toml("[source]\nheader_row = 0\n").is_err());
    }

    #[test]
    fn rejects_unknown_scorer_and_keys() {
        assert!(matches!(
            ReconConfig::from_toml("[matching]\nscorer = \"soundex\"\n"),
            Err(ReconError::ConfigParse(_))
        ));
        assert!(matches!(
            ReconConfig::from_toml("[matching]\ntreshold = 50\n"),
            Err(ReconError::ConfigParse(_))
        ));
    }

    #[test]
    fn cli_style_override_revalidates() {
        let mut config = ReconConfig::default();
        config.matching.threshold = 95;
        assert!(config.validate().is_err());
        config.matching.auto_confirm = 95;
        assert!(config.validate().is_ok());
    }
}
