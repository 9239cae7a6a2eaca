//! Category and tag command handlers

use anyhow::Result;

use linkkeep_core::Store;

use crate::output::Output;

/// Which label list an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Category,
    Tag,
}

impl LabelKind {
    pub fn singular(self) -> &'static str {
        match self {
            LabelKind::Category => "category",
            LabelKind::Tag => "tag",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Tag => "tags",
        }
    }
}

/// List every category or tag with its usage count
pub fn list(store: &Store, kind: LabelKind, output: &Output) -> Result<()> {
    let labels = match kind {
        LabelKind::Category => store.category_counts(),
        LabelKind::Tag => store.tag_counts(),
    };
    output.print_labels(kind.plural(), &labels);
    Ok(())
}

/// Add a label to the links at `indices`, or to every link
pub fn bulk_add(
    store: &mut Store,
    kind: LabelKind,
    label: &str,
    indices: Option<&[usize]>,
    output: &Output,
) -> Result<usize> {
    let count = match kind {
        LabelKind::Category => store.bulk_add_category(label, indices)?,
        LabelKind::Tag => store.bulk_add_tag(label, indices)?,
    };
    output.success(&format!(
        "Added {} '{}' to {} links.",
        kind.singular(),
        label.trim(),
        count
    ));
    Ok(count)
}

/// Remove a label from every link that has it
pub fn bulk_remove(store: &mut Store, kind: LabelKind, label: &str, output: &Output) -> Result<usize> {
    let count = match kind {
        LabelKind::Category => store.bulk_remove_category(label),
        LabelKind::Tag => store.bulk_remove_tag(label),
    };
    output.success(&format!(
        "Removed {} '{}' from {} links.",
        kind.singular(),
        label.trim(),
        count
    ));
    Ok(count)
}
