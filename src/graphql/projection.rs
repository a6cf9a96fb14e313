//! Field projection: turn the fields a query asked for into the minimal set
//! of columns to fetch.
//!
//! The transport layer hands us a [`RequestedFields`] tree built from the
//! GraphQL selection. [`project`] maps its leaves through the entity's
//! [`ColumnMap`], records nested selections on declared relations, and
//! always keeps the primary key so loaders can re-key rows. Unknown field
//! names are dropped without error so older servers tolerate newer clients.

use async_graphql::context::SelectionField;

/// Entity types that can be projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Comment,
}

impl EntityKind {
    pub fn column_map(self) -> &'static ColumnMap {
        match self {
            EntityKind::User => &USER_COLUMNS,
            EntityKind::Post => &POST_COLUMNS,
            EntityKind::Comment => &COMMENT_COLUMNS,
        }
    }
}

/// Field-name to column-name mapping for one entity type.
#[derive(Debug)]
pub struct ColumnMap {
    pub primary_key: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
    pub relations: &'static [(&'static str, EntityKind)],
}

impl ColumnMap {
    pub fn column(&self, field: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
    }

    pub fn relation(&self, field: &str) -> Option<EntityKind> {
        self.relations
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, target)| *target)
    }
}

pub static USER_COLUMNS: ColumnMap = ColumnMap {
    primary_key: "id",
    fields: &[
        ("id", "id"),
        ("name", "name"),
        ("email", "email"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
    relations: &[("posts", EntityKind::Post)],
};

pub static POST_COLUMNS: ColumnMap = ColumnMap {
    primary_key: "id",
    fields: &[
        ("id", "id"),
        ("title", "title"),
        ("content", "content"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
    relations: &[("author", EntityKind::User), ("comments", EntityKind::Comment)],
};

pub static COMMENT_COLUMNS: ColumnMap = ColumnMap {
    primary_key: "id",
    fields: &[
        ("id", "id"),
        ("comment", "comment"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
    ],
    relations: &[("user", EntityKind::User), ("post", EntityKind::Post)],
};

/// One requested output field and its nested selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedField {
    pub name: String,
    pub children: RequestedFields,
}

impl RequestedField {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: RequestedFields::default(),
        }
    }

    pub fn nested(name: impl Into<String>, children: RequestedFields) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// The selection of one field: the fields requested directly below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedFields(pub Vec<RequestedField>);

impl RequestedFields {
    /// Top-level fields with no nested selection.
    pub fn leaves(names: &[&str]) -> Self {
        Self(names.iter().map(|n| RequestedField::leaf(*n)).collect())
    }

    /// Build the tree below `field`. Fragments are already flattened by
    /// async-graphql; aliased duplicates are merged by field name.
    pub fn from_selection(field: SelectionField<'_>) -> Self {
        let mut fields: Vec<RequestedField> = Vec::new();
        for child in field.selection_set() {
            let nested = Self::from_selection(child);
            match fields.iter_mut().find(|f| f.name == child.name()) {
                Some(existing) => existing.children.merge(nested),
                None => fields.push(RequestedField::nested(child.name(), nested)),
            }
        }
        Self(fields)
    }

    fn merge(&mut self, other: RequestedFields) {
        for field in other.0 {
            match self.0.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => existing.children.merge(field.children),
                None => self.0.push(field),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestedField> {
        self.0.iter()
    }
}

/// A nested selection on a declared relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    pub name: String,
    pub target: EntityKind,
    /// Columns of the target entity, primary key included.
    pub sub_columns: Vec<String>,
}

/// Columns to fetch for one entity plus the relations the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub columns: Vec<String>,
    pub relations: Vec<RelationSpec>,
}

impl Projection {
    fn push_column(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
    }

    /// Add every column of `other` not already selected.
    pub fn merge_columns(&mut self, other: &Projection) {
        for column in &other.columns {
            self.push_column(column);
        }
    }

    /// Whether every column of `other` is selected here.
    pub fn covers(&self, other: &Projection) -> bool {
        other.columns.iter().all(|c| self.columns.contains(c))
    }

    /// The projected columns plus `extra`, without duplicates. Accessors use
    /// this to add the foreign keys they need for re-keying.
    pub fn columns_with(&self, extra: &[&str]) -> Vec<String> {
        let mut columns = self.columns.clone();
        for column in extra {
            if !columns.iter().any(|c| c == column) {
                columns.push((*column).to_string());
            }
        }
        columns
    }
}

/// Project a requested field tree onto an entity's columns.
pub fn project(requested: &RequestedFields, map: &ColumnMap) -> Projection {
    let mut projection = Projection::default();

    for field in requested.iter() {
        if field.is_introspection() {
            continue;
        }

        if field.children.is_empty() {
            if let Some(column) = map.column(&field.name) {
                projection.push_column(column);
            }
            continue;
        }

        let Some(target) = map.relation(&field.name) else {
            continue;
        };
        let target_map = target.column_map();
        let mut sub_columns: Vec<String> = Vec::new();
        for child in field.children.iter() {
            if child.is_introspection() || !child.children.is_empty() {
                continue;
            }
            if let Some(column) = target_map.column(&child.name) {
                if !sub_columns.iter().any(|c| c == column) {
                    sub_columns.push(column.to_string());
                }
            }
        }
        if !sub_columns.iter().any(|c| c == target_map.primary_key) {
            sub_columns.push(target_map.primary_key.to_string());
        }

        projection.relations.push(RelationSpec {
            name: field.name.clone(),
            target,
            sub_columns,
        });
    }

    projection.push_column(map.primary_key);
    projection
}

/// Projection for the field a resolver is currently resolving.
pub fn project_selection(field: SelectionField<'_>, kind: EntityKind) -> Projection {
    project(&RequestedFields::from_selection(field), kind.column_map())
}
