//! Logical entity definitions
//!
//! Every table is declared once here. Backend-specific column types are
//! derived from the [`LogicalType`] of each column by
//! [`SchemaMapping`](super::SchemaMapping); nothing in this file knows about
//! a particular engine.

/// Backend-independent column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    /// Opaque string identifier (primary keys and references to them)
    Id,
    /// Bounded string
    VarChar(u32),
    /// Unbounded string
    Text,
    /// 64-bit integer that must survive values beyond 2^53
    BigInt,
    /// Ordered list of strings, order and duplicates preserved
    StringList,
    /// Point in time
    Timestamp,
}

/// How a value is produced when the caller does not supply one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRule {
    None,
    /// 21-character random identifier generated by the application
    GeneratedId,
    /// Time of insertion
    CreationTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name in the database
    pub name: &'static str,
    pub logical_type: LogicalType,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: DefaultRule,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    const fn new(name: &'static str, logical_type: LogicalType) -> Self {
        Self {
            name,
            logical_type,
            nullable: false,
            primary_key: false,
            default: DefaultRule::None,
            references: None,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn default_rule(mut self, default: DefaultRule) -> Self {
        self.default = default;
        self
    }

    const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey { table, column });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Comma separated column names in declaration order
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column names without the ones filled in by the engine clock
    pub fn writable_column_list(&self) -> String {
        self.columns
            .iter()
            .filter(|c| c.default != DefaultRule::CreationTime)
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn primary_key(&self) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::new("id", LogicalType::Id)
            .primary_key()
            .default_rule(DefaultRule::GeneratedId),
        ColumnDef::new("created_at", LogicalType::Timestamp)
            .default_rule(DefaultRule::CreationTime),
    ],
};

pub const SESSIONS: TableDef = TableDef {
    name: "sessions",
    columns: &[
        ColumnDef::new("id", LogicalType::VarChar(128)).primary_key(),
        ColumnDef::new("user_id", LogicalType::Id).references("users", "id"),
        ColumnDef::new("active_expires", LogicalType::BigInt),
        ColumnDef::new("idle_expires", LogicalType::BigInt),
    ],
};

pub const KEYS: TableDef = TableDef {
    name: "keys",
    columns: &[
        ColumnDef::new("id", LogicalType::VarChar(255)).primary_key(),
        ColumnDef::new("user_id", LogicalType::Id).references("users", "id"),
        ColumnDef::new("hashed_password", LogicalType::VarChar(255)).nullable(),
    ],
};

pub const BOOKMARKS: TableDef = TableDef {
    name: "bookmarks",
    columns: &[
        ColumnDef::new("id", LogicalType::Id)
            .primary_key()
            .default_rule(DefaultRule::GeneratedId),
        ColumnDef::new("url", LogicalType::Text),
        ColumnDef::new("tags", LogicalType::StringList).nullable(),
        ColumnDef::new("collection", LogicalType::Text).nullable(),
        // Owner reference is not enforced by a constraint.
        ColumnDef::new("user_id", LogicalType::Id).nullable(),
        ColumnDef::new("created_at", LogicalType::Timestamp)
            .default_rule(DefaultRule::CreationTime),
    ],
};

pub const TAGS: TableDef = TableDef {
    name: "tags",
    columns: &[
        ColumnDef::new("id", LogicalType::Id)
            .primary_key()
            .default_rule(DefaultRule::GeneratedId),
        ColumnDef::new("name", LogicalType::Text),
    ],
};

pub const BOOKMARKS_TO_TAGS: TableDef = TableDef {
    name: "bookmarksToTags",
    columns: &[
        ColumnDef::new("bookmark_id", LogicalType::Id)
            .references("bookmarks", "id"),
        ColumnDef::new("tag_id", LogicalType::Id).references("tags", "id"),
    ],
};

/// All tables, referenced tables before referencing ones
pub const ALL_TABLES: [&TableDef; 6] = [
    &USERS,
    &SESSIONS,
    &KEYS,
    &BOOKMARKS,
    &TAGS,
    &BOOKMARKS_TO_TAGS,
];
