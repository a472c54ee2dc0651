use crate::model::Article;

pub const DIGEST_SUBJECT: &str = "Daily news digest";

#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    #[error("There is no article to send")]
    EmptyDigest,
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("SMTP transport is not configured")]
    NotConfigured,
    #[error("Could not build the digest message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("Could not send the digest: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Format the rows into the plain text digest body.
///
/// The listing is deterministic: a header naming the filter condition,
/// then for each row a keyword-tagged title, a date line (blank when the
/// row has no date) and a link line, separated by blank lines. An empty
/// table is an error; an empty digest is never sent.
pub fn compose(label: &str, rows: &[Article]) -> Result<String, DigestError> {
    if rows.is_empty() {
        return Err(DigestError::EmptyDigest);
    }

    let mut lines = vec![
        format!("Condition: {label}"),
        String::new(),
        String::from("Articles:"),
        "-".repeat(40),
    ];

    for row in rows {
        let date = row
            .published
            .map(|published| published.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        lines.push(format!("- [{}] {}", row.keyword, row.title));
        lines.push(format!("  · Date: {date}"));
        lines.push(format!("  · Link: {}", row.link));
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}
