use tabled::{Table, builder::Builder, settings};

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render arbitrary string rows with the provided style.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if headers.is_empty() && rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_table_renders_headers_and_cells() {
        let rendered = render_string_table(
            &["Column", "Token"],
            vec![vec!["column1".into(), "Literal".into()]],
            TableStyleKind::Ascii,
        );
        assert!(rendered.contains("Column"));
        assert!(rendered.contains("column1"));
        assert!(rendered.contains("Literal"));
    }

    #[test]
    fn empty_tables_render_placeholder() {
        assert_eq!(
            render_string_table(&[], vec![], TableStyleKind::Plain),
            "<empty>"
        );
    }
}
