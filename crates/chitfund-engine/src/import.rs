// crates/chitfund-engine/src/import.rs
//
// Bulk member import from delimited text.
//
// The header row names the columns; order does not matter and header
// matching ignores case and surrounding whitespace. The national ID column
// accepts several spellings. The batch is all-or-nothing: one bad row
// rejects the whole file. Attaching the new members to funds happens after
// the insert and only produces warnings on failure.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use chitfund_core::error::ChitError;
use chitfund_core::member::{Member, MemberDetails};

use crate::registry::FundRegistry;

const NAME_HEADERS: &[&str] = &["name"];
const MOBILE_HEADERS: &[&str] = &["mobile"];
const EMAIL_HEADERS: &[&str] = &["email"];
const LOCATION_HEADERS: &[&str] = &["location"];
const NATIONAL_ID_HEADERS: &[&str] = &["aadhar", "aadhaar", "nationalid", "national id"];

/// Outcome of an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub count: usize,
    pub members: Vec<Member>,
    /// Fund attachment failures. The members were still created.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    mobile: usize,
    email: usize,
    location: usize,
    national_id: usize,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&h.trim().to_ascii_lowercase().as_str()))
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, ChitError> {
    let lookups = [
        ("Name", find_column(headers, NAME_HEADERS)),
        ("Mobile", find_column(headers, MOBILE_HEADERS)),
        ("Email", find_column(headers, EMAIL_HEADERS)),
        ("Location", find_column(headers, LOCATION_HEADERS)),
        ("Aadhar", find_column(headers, NATIONAL_ID_HEADERS)),
    ];

    let missing: Vec<&str> = lookups
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(label, _)| *label)
        .collect();
    if !missing.is_empty() {
        return Err(ChitError::Validation(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let idx = |i: usize| lookups[i].1.unwrap_or_default();
    Ok(Columns {
        name: idx(0),
        mobile: idx(1),
        email: idx(2),
        location: idx(3),
        national_id: idx(4),
    })
}

/// Parse delimited text into validated member details.
///
/// Blank rows are skipped. Any row with a missing required field fails the
/// whole parse with a `Validation` error naming the line.
pub fn parse_members(input: &str) -> Result<Vec<MemberDetails>, ChitError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ChitError::Validation(format!("Unreadable header row: {}", e)))?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ChitError::Validation(format!("Parse error: {}", e)))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        let details = MemberDetails {
            name: cell(columns.name),
            mobile: cell(columns.mobile),
            email: cell(columns.email),
            location: cell(columns.location),
            national_id: cell(columns.national_id),
        }
        .normalized()
        .map_err(|e| match e {
            ChitError::Validation(msg) => ChitError::Validation(format!("Line {}: {}", line, msg)),
            other => other,
        })?;
        rows.push(details);
    }

    if rows.is_empty() {
        return Err(ChitError::Validation("No member rows found".to_string()));
    }
    Ok(rows)
}

/// Import members from delimited text and optionally attach them to funds.
pub async fn import_members(
    registry: &FundRegistry,
    input: &str,
    fund_ids: &[Uuid],
) -> Result<ImportReport, ChitError> {
    let details = parse_members(input)?;
    let members = registry.create_members(details).await?;
    info!(count = members.len(), funds = fund_ids.len(), "Bulk import stored members");

    let ids: Vec<String> = members.iter().map(|m| m.member_id.clone()).collect();
    let mut warnings = Vec::new();
    for fund_id in fund_ids {
        if let Err(e) = registry.add_members(fund_id, ids.clone()).await {
            warn!(fund = %fund_id, error = %e, "Failed to attach imported members to fund");
            warnings.push(format!("Fund {}: {}", fund_id, e));
        }
    }

    Ok(ImportReport {
        count: members.len(),
        members,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chitfund_core::fund::FundConfig;
    use chitfund_store::InMemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    const SAMPLE: &str = "Name,Mobile,Email,Location,Aadhar\n\
        Anitha,9847000001,anitha@example.com,Kochi,123412341234\n\
        \n\
        Biju , 9847000002 ,biju@example.com,Thrissur,234523452345\n\
        Chandran,9847000003,chandran@example.com,Kannur,345634563456\n";

    fn registry() -> FundRegistry {
        let store = Arc::new(InMemoryStore::new());
        FundRegistry::new(store.clone(), store).with_rng(StdRng::seed_from_u64(99))
    }

    #[test]
    fn test_parse_trims_and_skips_blank_rows() {
        let rows = parse_members(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].name, "Biju");
        assert_eq!(rows[1].mobile, "9847000002");
    }

    #[test]
    fn test_parse_header_aliases_and_order() {
        let input = "email, NATIONAL ID ,name,location,mobile\n\
            x@example.com,1111,Xavier,Alappuzha,9000000001\n";
        let rows = parse_members(input).unwrap();
        assert_eq!(rows[0].name, "Xavier");
        assert_eq!(rows[0].national_id, "1111");
    }

    #[test]
    fn test_parse_missing_column() {
        let err = parse_members("Name,Mobile,Email\nA,1,a@x\n").unwrap_err();
        match err {
            ChitError::Validation(msg) => {
                assert!(msg.contains("Location"));
                assert!(msg.contains("Aadhar"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_field_names_line() {
        let input = "Name,Mobile,Email,Location,Aadhar\n\
            A,1,a@x,Kochi,1\n\
            B,2,,Kochi,2\n";
        let err = parse_members(input).unwrap_err();
        match err {
            ChitError::Validation(msg) => {
                assert!(msg.contains("Line 3"), "{}", msg);
                assert!(msg.contains("email"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_members("Name,Mobile,Email,Location,Aadhar\n").is_err());
    }

    #[tokio::test]
    async fn test_import_twice_yields_distinct_ids() {
        let reg = registry();
        let first = import_members(&reg, SAMPLE, &[]).await.unwrap();
        let second = import_members(&reg, SAMPLE, &[]).await.unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(second.count, 3);

        let ids: HashSet<_> = first
            .members
            .iter()
            .chain(second.members.iter())
            .map(|m| m.member_id.clone())
            .collect();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn test_invalid_row_inserts_nothing() {
        let reg = registry();
        let input = "Name,Mobile,Email,Location,Aadhar\n\
            A,1,a@x,Kochi,1\n\
            B,2,b@x,,2\n";
        assert!(import_members(&reg, input, &[]).await.is_err());
        assert!(reg.list_members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attach_failures_become_warnings() {
        let reg = registry();
        let fund = reg
            .create_fund(
                FundConfig {
                    name: "Import Target".to_string(),
                    total_members: 10,
                    draw_day: 3,
                    monthly_amount: 1_000,
                },
                vec![],
            )
            .await
            .unwrap();
        let missing = Uuid::now_v7();

        let report = import_members(&reg, SAMPLE, &[fund.id, missing]).await.unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains(&missing.to_string()));
        assert_eq!(reg.get_fund(&fund.id).await.unwrap().active_members.len(), 3);
    }
}
