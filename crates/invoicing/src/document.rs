//! The editable billing document (form model).

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use quoteprint_core::{DomainError, DomainResult};

use crate::amount;

/// Date format used by form inputs (`<input type="date">` style).
pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a form date; anything that is not a valid `YYYY-MM-DD` clears the date.
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), FORM_DATE_FORMAT).ok()
}

/// Which kind of billing document is being exported.
///
/// Only the title, number label and file name differ; the layout is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Quotation,
    Invoice,
}

impl DocumentType {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "Quotation",
            DocumentType::Invoice => "Invoice",
        }
    }

    /// Label printed in front of the document number.
    pub fn number_label(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "QUOTE",
            DocumentType::Invoice => "INVO",
        }
    }

    pub fn preview_title(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "Quotation Preview",
            DocumentType::Invoice => "Invoice Preview",
        }
    }
}

impl core::str::FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quotation" | "quote" => Ok(DocumentType::Quotation),
            "invoice" => Ok(DocumentType::Invoice),
            other => Err(DomainError::validation(format!(
                "unknown document type {other:?} (expected quotation or invoice)"
            ))),
        }
    }
}

/// Payee printed under "MAKE ALL CHECK PAYABLE TO".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PayableTo {
    #[serde(rename = "GREAT ESCAPE TOURISM")]
    GreatEscapeTourism,
    #[serde(rename = "MR BIKE DELIVERY")]
    MrBikeDelivery,
    #[default]
    #[serde(rename = "GREAT ESCAPE TOURISM & MR BIKE DELIVERY")]
    Both,
}

impl PayableTo {
    pub const ALL: [PayableTo; 3] = [
        PayableTo::GreatEscapeTourism,
        PayableTo::MrBikeDelivery,
        PayableTo::Both,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayableTo::GreatEscapeTourism => "GREAT ESCAPE TOURISM",
            PayableTo::MrBikeDelivery => "MR BIKE DELIVERY",
            PayableTo::Both => "GREAT ESCAPE TOURISM & MR BIKE DELIVERY",
        }
    }
}

impl core::str::FromStr for PayableTo {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PayableTo::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown payee {s:?}")))
    }
}

/// One billed line.
///
/// `amount` is derived from `quantity` and `unit_price` and cannot be set
/// directly; every setter that touches either input recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LineItemFields")]
pub struct LineItem {
    date: Option<NaiveDate>,
    description: String,
    quantity: String,
    unit_price: String,
    amount: String,
}

impl LineItem {
    pub fn new(
        date: Option<NaiveDate>,
        description: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
    ) -> Self {
        let mut item = Self {
            date,
            description: description.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
            amount: String::new(),
        };
        item.recompute_amount();
        item
    }

    /// A fresh line as added from the form: dated `today`, quantity 1, unpriced.
    pub fn blank(today: NaiveDate) -> Self {
        Self::new(Some(today), "", "1", "")
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn unit_price(&self) -> &str {
        &self.unit_price
    }

    /// Two-decimal amount, or empty while the line is not priced.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_quantity(&mut self, quantity: impl Into<String>) {
        self.quantity = quantity.into();
        self.recompute_amount();
    }

    pub fn set_unit_price(&mut self, unit_price: impl Into<String>) {
        self.unit_price = unit_price.into();
        self.recompute_amount();
    }

    fn recompute_amount(&mut self) {
        self.amount = amount::compute(&self.quantity, &self.unit_price);
    }
}

/// Wire shape of a line item. Any `amount` in the input is ignored and
/// re-derived; quantity and unit price may be JSON numbers or strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemFields {
    #[serde(default, deserialize_with = "lenient_date")]
    date: Option<NaiveDate>,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "text_or_number")]
    quantity: String,
    #[serde(default, deserialize_with = "text_or_number")]
    unit_price: String,
}

impl From<LineItemFields> for LineItem {
    fn from(f: LineItemFields) -> Self {
        LineItem::new(f.date, f.description, f.quantity, f.unit_price)
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(f64),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_form_date))
}

/// Document header (numbering, dates, job details).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderFields {
    #[serde(rename = "quoteNo", alias = "documentNumber")]
    pub document_number: String,
    #[serde(deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    pub salesperson: String,
    pub job: String,
    pub subject: String,
}

/// Billed party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientFields {
    pub company: String,
    pub trn: String,
    pub po_box: String,
    pub attention: String,
}

/// Where payment should be sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankingFields {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub iban: String,
    pub branch: String,
}

/// Addressable text field of the document, for field-level edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    DocumentNumber,
    Date,
    DueDate,
    Salesperson,
    Job,
    Subject,
    Company,
    Trn,
    PoBox,
    Attention,
    BankName,
    AccountName,
    AccountNumber,
    Iban,
    Branch,
}

/// Lowercase with `_`/`-` removed, so `po_box`, `po-box` and `poBox` agree.
fn field_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl core::str::FromStr for DocumentField {
    type Err = DomainError;

    /// Accepts the JSON key of the field in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match field_key(s).as_str() {
            "quoteno" | "documentnumber" | "number" => DocumentField::DocumentNumber,
            "date" => DocumentField::Date,
            "duedate" => DocumentField::DueDate,
            "salesperson" => DocumentField::Salesperson,
            "job" => DocumentField::Job,
            "subject" => DocumentField::Subject,
            "company" => DocumentField::Company,
            "trn" => DocumentField::Trn,
            "pobox" => DocumentField::PoBox,
            "attention" => DocumentField::Attention,
            "bankname" => DocumentField::BankName,
            "accountname" => DocumentField::AccountName,
            "accountnumber" => DocumentField::AccountNumber,
            "iban" => DocumentField::Iban,
            "branch" => DocumentField::Branch,
            _ => return Err(DomainError::validation(format!("unknown document field {s:?}"))),
        };
        Ok(field)
    }
}

/// Editable field of a line item. `amount` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Date,
    Description,
    Quantity,
    UnitPrice,
}

impl core::str::FromStr for ItemField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match field_key(s).as_str() {
            "date" => Ok(ItemField::Date),
            "description" => Ok(ItemField::Description),
            "quantity" | "qty" => Ok(ItemField::Quantity),
            "unitprice" | "price" => Ok(ItemField::UnitPrice),
            "amount" => Err(DomainError::validation(
                "amount is derived from quantity and unit price",
            )),
            _ => Err(DomainError::validation(format!("unknown item field {s:?}"))),
        }
    }
}

/// The billing document being edited.
///
/// Lives for one editing session and is never persisted; each export works
/// on a cloned snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    #[serde(flatten)]
    pub header: HeaderFields,
    #[serde(flatten)]
    pub client: ClientFields,
    #[serde(flatten)]
    pub banking: BankingFields,
    #[serde(default)]
    pub payable_to: PayableTo,
    #[serde(default = "default_vat_enabled")]
    pub vat_enabled: bool,
    #[serde(default)]
    items: Vec<LineItem>,
}

fn default_vat_enabled() -> bool {
    true
}

impl Default for InvoiceDocument {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl InvoiceDocument {
    /// Session defaults: dated `today`, default payee, VAT on, no items.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            header: HeaderFields {
                date: Some(today),
                ..HeaderFields::default()
            },
            client: ClientFields::default(),
            banking: BankingFields::default(),
            payable_to: PayableTo::default(),
            vat_enabled: true,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Set a text field. Date fields accept `YYYY-MM-DD`; anything else clears them.
    pub fn set_field(&mut self, field: DocumentField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DocumentField::DocumentNumber => self.header.document_number = value,
            DocumentField::Date => self.header.date = parse_form_date(&value),
            DocumentField::DueDate => self.header.due_date = parse_form_date(&value),
            DocumentField::Salesperson => self.header.salesperson = value,
            DocumentField::Job => self.header.job = value,
            DocumentField::Subject => self.header.subject = value,
            DocumentField::Company => self.client.company = value,
            DocumentField::Trn => self.client.trn = value,
            DocumentField::PoBox => self.client.po_box = value,
            DocumentField::Attention => self.client.attention = value,
            DocumentField::BankName => self.banking.bank_name = value,
            DocumentField::AccountName => self.banking.account_name = value,
            DocumentField::AccountNumber => self.banking.account_number = value,
            DocumentField::Iban => self.banking.iban = value,
            DocumentField::Branch => self.banking.branch = value,
        }
    }

    pub fn set_payable_to(&mut self, payable_to: PayableTo) {
        self.payable_to = payable_to;
    }

    /// Flip the VAT flag. Only the printed label changes; totals do not.
    pub fn toggle_vat(&mut self) -> bool {
        self.vat_enabled = !self.vat_enabled;
        self.vat_enabled
    }

    /// Append a blank line dated `today`; returns its index.
    pub fn add_item(&mut self, today: NaiveDate) -> usize {
        self.push_item(LineItem::blank(today))
    }

    pub fn push_item(&mut self, item: LineItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> DomainResult<LineItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Move the line at `from` so it ends up at position `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> DomainResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    /// Edit one field of one line; quantity and price edits re-derive its amount.
    pub fn set_item_field(
        &mut self,
        index: usize,
        field: ItemField,
        value: impl Into<String>,
    ) -> DomainResult<()> {
        self.check_index(index)?;
        let value = value.into();
        let item = &mut self.items[index];
        match field {
            ItemField::Date => item.set_date(parse_form_date(&value)),
            ItemField::Description => item.set_description(value),
            ItemField::Quantity => item.set_quantity(value),
            ItemField::UnitPrice => item.set_unit_price(value),
        }
        tracing::trace!(index, ?field, amount = item.amount(), "line item edited");
        Ok(())
    }

    fn check_index(&self, index: usize) -> DomainResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(DomainError::out_of_range(index, self.items.len()))
        }
    }
}
