//! Declarative table definitions and the DDL rendered from them

use cw_core::sql_utils::quote_ident;

/// One column of a warehouse table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

impl Column {
    pub const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
        }
    }
}

/// Foreign key from a column of this table to the key of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
    pub ref_column: &'static str,
}

impl ForeignKey {
    pub const fn new(
        column: &'static str,
        references: &'static str,
        ref_column: &'static str,
    ) -> Self {
        Self {
            column,
            references,
            ref_column,
        }
    }
}

/// A star-schema table
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: &'static str,
    pub unique: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    /// Secondary indexes, each a list of columns
    pub indexes: &'static [&'static [&'static str]],
}

impl TableDef {
    pub fn is_fact(&self) -> bool {
        self.name.starts_with("fact_")
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `(name, type)` pairs in column order, as bound by inserts
    pub fn column_types(&self) -> Vec<(&'static str, &'static str)> {
        self.columns.iter().map(|c| (c.name, c.sql_type)).collect()
    }

    pub fn create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut line = format!("{} {}", quote_ident(c.name), c.sql_type);
                if c.name == self.primary_key {
                    line.push_str(" PRIMARY KEY");
                } else {
                    if !c.nullable {
                        line.push_str(" NOT NULL");
                    }
                    if self.unique.contains(&c.name) {
                        line.push_str(" UNIQUE");
                    }
                }
                line
            })
            .collect();

        for fk in self.foreign_keys {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                quote_ident(fk.column),
                quote_ident(fk.references),
                quote_ident(fk.ref_column)
            ));
        }

        format!(
            "CREATE TABLE {} (\n    {}\n)",
            quote_ident(self.name),
            lines.join(",\n    ")
        )
    }

    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|cols| {
                format!(
                    "CREATE INDEX {} ON {} ({})",
                    quote_ident(&format!("idx_{}_{}", self.name, cols.join("_"))),
                    quote_ident(self.name),
                    cols.iter()
                        .map(|c| quote_ident(c))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
            .collect()
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(self.name))
    }

    pub fn truncate_sql(&self) -> String {
        format!("DELETE FROM {}", quote_ident(self.name))
    }
}
