use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::api::{FlexibleId, FlexibleNumber};
use crate::feed::domain::{RawLoan, RawLoanEvent, RawLoanProduct, RawTransaction};

pub(crate) fn parse_events<R: Read>(reader: R) -> Result<Vec<RawLoanEvent>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut events = Vec::new();

    for record in csv_reader.deserialize::<LoanExportRow>() {
        events.push(record?.into_event());
    }

    Ok(events)
}

/// One row of a loan export. Columns other than these are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoanExportRow {
    #[serde(deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    amount: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    client: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    borrower_name: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    loan_number: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    created_by: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    office_id: Option<String>,
    #[serde(rename = "type", deserialize_with = "empty_string_as_none")]
    event_type: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    principal: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    loan_product: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    transaction_type: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    credit: Option<String>,
}

impl LoanExportRow {
    fn into_event(self) -> RawLoanEvent {
        let loan = (self.principal.is_some() || self.loan_product.is_some()).then(|| RawLoan {
            principal: self.principal.map(FlexibleNumber::Text),
            loan_product: self.loan_product.map(|name| RawLoanProduct { name: Some(name) }),
            ..RawLoan::default()
        });
        let transaction = (self.transaction_type.is_some() || self.credit.is_some()).then(|| {
            RawTransaction {
                id: None,
                transaction_type: self.transaction_type,
                credit: self.credit.map(FlexibleNumber::Text),
            }
        });

        RawLoanEvent {
            id: self.id.map(FlexibleId::Text),
            amount: self.amount.map(FlexibleNumber::Text),
            client: self.client,
            borrower_name: self.borrower_name,
            loan_number: self.loan_number,
            status: self.status,
            created_by: self.created_by.map(FlexibleId::Text),
            office_id: self.office_id.map(FlexibleNumber::Text),
            event_type: self.event_type,
            created_at: self.created_at,
            loan,
            transaction,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
