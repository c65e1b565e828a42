use sha2::{Digest, Sha256};

use crate::domain::snapshot::{Attribute, Snapshot};
use crate::domain::value_objects::Fingerprint;

/// Compute a SHA-256 fingerprint of a snapshot's structure.
///
/// Algorithm:
/// 1. Each column is rendered to one canonical line:
///    `table\tcolumn\tField\tType\tNull\tKey\tDefault\tExtra`, with an absent
///    `Default` written as `\0` so it never collides with an empty string.
/// 2. Lines are sorted so the fingerprint is independent of table and column order.
/// 3. Lines are joined with `\n` and hashed with SHA-256.
///
/// `label` and `captured_at` do not take part. Tables without columns
/// contribute a `table` line of their own so they still change the hash.
pub fn fingerprint(snapshot: &Snapshot) -> Fingerprint {
    let mut lines: Vec<String> = Vec::with_capacity(snapshot.column_count());

    for (table, columns) in &snapshot.tables {
        if columns.is_empty() {
            lines.push(table.clone());
        }
        for (name, column) in columns {
            let mut line = format!("{table}\t{name}");
            for attr in Attribute::ALL {
                line.push('\t');
                line.push_str(column.attribute(attr).unwrap_or("\0"));
            }
            lines.push(line);
        }
    }

    lines.sort_unstable();

    let hash = Sha256::digest(lines.join("\n").as_bytes());
    Fingerprint(format!("{:x}", hash))
}
