//! Classification des identifiants Lot/Plan (QLD vs NSW)
//!
//! Le Queensland utilise un identifiant concaténé (`6RP702264`), la
//! Nouvelle-Galles du Sud un identifiant `lot/section/plan` (`5//DP123456`).
//! La distinction est une heuristique par regex, pas une vérification
//! d'appartenance territoriale.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{LotPlanError, Result};

/// Juridiction cadastrale d'un identifiant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Jurisdiction {
    /// Queensland : champ `lotplan`
    Qld,
    /// New South Wales : champ `lotidstring`
    Nsw,
}

impl Jurisdiction {
    /// Nom du champ interrogé sur le service ArcGIS
    pub fn query_field(self) -> &'static str {
        match self {
            Self::Qld => "lotplan",
            Self::Nsw => "lotidstring",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qld => f.write_str("QLD"),
            Self::Nsw => f.write_str("NSW"),
        }
    }
}

/// Décomposition NSW `lot/section/plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NswParts {
    pub lot: String,
    /// `None` quand la section est absente ou vide
    pub section: Option<String>,
    pub plan: String,
}

impl NswParts {
    /// Numéro de plan sans préfixe (`DP123456` → `123456`)
    pub fn plan_number(&self) -> String {
        self.plan.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Prédicat décomposé sur `lotnumber` / `sectionnumber` / `plannumber`
    pub fn where_clause(&self) -> String {
        let mut clauses = vec![format!("lotnumber='{}'", sql_escape(&self.lot))];
        match &self.section {
            Some(section) => clauses.push(format!("sectionnumber='{}'", sql_escape(section))),
            None => clauses.push("(sectionnumber IS NULL OR sectionnumber = '')".to_string()),
        }
        clauses.push(format!("plannumber={}", self.plan_number()));
        clauses.join(" AND ")
    }
}

/// Requête prête à être envoyée au service de la juridiction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParcelQuery {
    pub jurisdiction: Jurisdiction,
    pub field: &'static str,
    pub value: String,
    /// Présent uniquement pour NSW
    pub parts: Option<NswParts>,
}

impl ParcelQuery {
    /// Clause `where` ArcGIS : `{field}='{value}'`
    pub fn where_clause(&self) -> String {
        format!("{}='{}'", self.field, sql_escape(&self.value))
    }
}

fn qld_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\d+[A-Z]{1,3}\d+$").expect("valid QLD regex"))
}

/// Vrai si le token a la forme QLD `chiffres, 1-3 lettres, chiffres`
pub fn is_qld(token: &str) -> bool {
    qld_pattern().is_match(token)
}

/// Classe un identifiant et construit la requête correspondante.
///
/// # Errors
///
/// Retourne `LotPlanError::InvalidIdentifier` si le token est vide, ne
/// contient pas de `/` sans être QLD, ou ne se découpe pas en 2 ou 3 parties.
pub fn classify(token: &str) -> Result<ParcelQuery> {
    let token = token.trim();
    if token.is_empty() {
        return Err(LotPlanError::invalid_identifier(token, "empty identifier"));
    }

    if is_qld(token) {
        return Ok(ParcelQuery {
            jurisdiction: Jurisdiction::Qld,
            field: Jurisdiction::Qld.query_field(),
            value: token.to_uppercase(),
            parts: None,
        });
    }

    let parts = split_nsw(token)?;
    let value = format!(
        "{}/{}/{}",
        parts.lot,
        parts.section.as_deref().unwrap_or(""),
        parts.plan
    );

    Ok(ParcelQuery {
        jurisdiction: Jurisdiction::Nsw,
        field: Jurisdiction::Nsw.query_field(),
        value,
        parts: Some(parts),
    })
}

fn split_nsw(token: &str) -> Result<NswParts> {
    let segments: Vec<&str> = token.split('/').map(str::trim).collect();

    let (lot, section, plan) = match segments.as_slice() {
        [lot, plan] => (*lot, None, *plan),
        [lot, section, plan] => {
            let section = Some(*section).filter(|s| !s.is_empty());
            (*lot, section, *plan)
        }
        [_] => {
            return Err(LotPlanError::invalid_identifier(
                token,
                "not a QLD lotplan and no '/' separator",
            ))
        }
        _ => {
            return Err(LotPlanError::invalid_identifier(
                token,
                format!("expected lot[/section]/plan, got {} parts", segments.len()),
            ))
        }
    };

    if lot.is_empty() {
        return Err(LotPlanError::invalid_identifier(token, "missing lot number"));
    }
    if plan.is_empty() {
        return Err(LotPlanError::invalid_identifier(token, "missing plan"));
    }
    if !plan.chars().any(|c| c.is_ascii_digit()) {
        return Err(LotPlanError::invalid_identifier(token, "plan has no number"));
    }

    Ok(NswParts {
        lot: lot.to_string(),
        section: section.map(str::to_string),
        plan: plan.to_uppercase(),
    })
}

/// Double les apostrophes pour un littéral SQL ArcGIS
fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}
