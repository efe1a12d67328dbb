//! Ordinal indices and group labels.

use rowsync_core::GroupKey;

use crate::presenter::Presenter;
use crate::rows::RowList;

/// Recompute row indices and group labels, telling the presenter about changes.
///
/// A label goes on the first visible row of each run of equal group keys.
/// Rows without a group do not break a run. The heuristic row never gets a
/// label, and there are no labels at all for an empty search string or when
/// `enabled` is false.
pub fn update_indices_and_labels<P>(
    rows: &mut RowList,
    search_string: &str,
    enabled: bool,
    presenter: &mut P,
) where
    P: Presenter + ?Sized,
{
    let labels_on = enabled && !search_string.is_empty();
    let mut current: Option<GroupKey> = None;

    for (index, row) in rows.iter_mut().enumerate() {
        if row.index() != index {
            row.set_index(index);
            presenter.set_row_index(row.id(), index);
        }

        let label = if !labels_on || !row.is_visible() || row.result().heuristic {
            None
        } else {
            match &row.result().group {
                Some(group) if current.as_ref() != Some(group) => {
                    current = Some(group.clone());
                    Some(group.clone())
                }
                _ => None,
            }
        };

        if row.label() != label.as_ref() {
            presenter.set_row_label(row.id(), label.as_ref());
            row.set_label(label);
        }
    }
}
