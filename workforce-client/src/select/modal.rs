//! Headless state for a searchable, paginated selection dialog.
//!
//! The caller owns the records and passes them in on every call that needs
//! them; the modal only keeps the search term, paging and the selected ids.

use super::accessor::{Accessor, Column, Record};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 3] = [10, 20, 50];

/// What the modal shows and how rows are identified.
#[derive(Debug, Clone)]
pub struct SelectModalConfig<T> {
    id: Accessor<T>,
    columns: Vec<Column<T>>,
    search_fields: Vec<Accessor<T>>,
    multi_select: bool,
    initial_selected: Vec<String>,
    disabled_ids: HashSet<String>,
    page_size_options: Vec<usize>,
    default_page_size: usize,
}

impl<T: Serialize> SelectModalConfig<T> {
    pub fn new(id: Accessor<T>) -> Self {
        Self {
            id,
            columns: Vec::new(),
            search_fields: Vec::new(),
            multi_select: true,
            initial_selected: Vec::new(),
            disabled_ids: HashSet::new(),
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Rows are identified by the named field.
    pub fn keyed_by(field: impl Into<String>) -> Self {
        Self::new(Accessor::field(field))
    }

    pub fn column(mut self, column: Column<T>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn search_field(mut self, field: impl Into<String>) -> Self {
        self.search_fields.push(Accessor::field(field));
        self
    }

    pub fn search_by(mut self, accessor: Accessor<T>) -> Self {
        self.search_fields.push(accessor);
        self
    }

    pub fn multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn initial_selected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_selected = dedup(ids);
        self
    }

    pub fn disabled_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Zero entries are dropped.
    pub fn page_size_options(mut self, options: impl IntoIterator<Item = usize>) -> Self {
        self.page_size_options = options.into_iter().filter(|&size| size > 0).collect();
        self
    }

    /// Zero falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
        self
    }

    pub fn build(self) -> SelectModal<T> {
        SelectModal::new(self)
    }
}

fn dedup<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(Into::into)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// One visible row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRow {
    pub id: String,
    pub cells: Vec<String>,
    pub selected: bool,
    pub disabled: bool,
}

/// Everything a renderer needs for the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectView {
    pub headers: Vec<String>,
    pub rows: Vec<SelectRow>,
    pub search: String,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub filtered_total: usize,
    pub selected_count: usize,
    /// Every selectable row on this page is selected (false when the page
    /// has no selectable rows).
    pub all_on_page_selected: bool,
    pub multi_select: bool,
}

#[derive(Debug, Clone)]
pub struct SelectModal<T> {
    config: SelectModalConfig<T>,
    open: bool,
    search: String,
    page: usize,
    page_size: usize,
    // Insertion-ordered; ids are unique.
    selected: Vec<String>,
}

impl<T: Serialize> SelectModal<T> {
    pub fn new(config: SelectModalConfig<T>) -> Self {
        let page_size = config.default_page_size;
        Self {
            config,
            open: false,
            search: String::new(),
            page: 1,
            page_size,
            selected: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open with a clean slate: initial selection, no search, first page,
    /// default page size. Already open: nothing changes.
    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        self.search.clear();
        self.page = 1;
        self.page_size = self.config.default_page_size;
        self.selected = self.config.initial_selected.clone();
    }

    /// Close and forget the session's search, paging and selection.
    pub fn close(&mut self) {
        self.open = false;
        self.search.clear();
        self.page = 1;
        self.page_size = self.config.default_page_size;
        self.selected.clear();
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    /// Used as the selection the next time the modal opens.
    pub fn set_initial_selected<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.initial_selected = dedup(ids);
    }

    /// Takes effect immediately. Already-selected ids stay selected.
    pub fn set_disabled_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.disabled_ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero is ignored.
    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        self.page_size = size;
        self.page = 1;
    }

    /// Stored as requested; reads clamp it to the pages that exist.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.config.disabled_ids.contains(id)
    }

    /// Single-select replaces the selection with `id`; multi-select flips
    /// its membership. Disabled ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if self.is_disabled(id) {
            return;
        }

        if !self.config.multi_select {
            self.selected = vec![id.to_string()];
        } else if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    /// Select every selectable row on the current page, or deselect them
    /// all if they already are.
    pub fn toggle_page(&mut self, items: &[T]) {
        let page_ids: Vec<String> = self
            .page_rows(items)
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| !self.is_disabled(id))
            .collect();

        if page_ids.is_empty() {
            return;
        }

        if page_ids.iter().all(|id| self.is_selected(id)) {
            self.selected.retain(|id| !page_ids.contains(id));
        } else if !self.config.multi_select {
            // Radio semantics cannot hold a page; keep the first row.
            self.selected = vec![page_ids[0].clone()];
        } else {
            for id in page_ids {
                if !self.is_selected(&id) {
                    self.selected.push(id);
                }
            }
        }
    }

    /// The selection in the order it was made. The caller persists it and
    /// closes the modal.
    pub fn confirm(&self) -> Vec<String> {
        self.selected.clone()
    }

    fn normalized_search(&self) -> String {
        self.search.trim().to_lowercase()
    }

    /// Items matching the search term, in source order.
    pub fn filtered<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        let term = self.normalized_search();
        if term.is_empty() || self.config.search_fields.is_empty() {
            return items.iter().collect();
        }

        items
            .iter()
            .filter(|item| {
                let record = Record::new(*item);
                self.config
                    .search_fields
                    .iter()
                    .any(|field| field.read(&record).to_lowercase().contains(&term))
            })
            .collect()
    }

    pub fn page_count(&self, filtered_total: usize) -> usize {
        filtered_total.div_ceil(self.page_size).max(1)
    }

    /// Requested page clamped to `1..=page_count`.
    pub fn current_page(&self, filtered_total: usize) -> usize {
        self.page.clamp(1, self.page_count(filtered_total))
    }

    fn page_rows<'a>(&self, items: &'a [T]) -> Vec<(String, &'a T)> {
        let filtered = self.filtered(items);
        let page = self.current_page(filtered.len());
        let start = (page - 1) * self.page_size;

        filtered
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .map(|item| (self.config.id.get(item), item))
            .collect()
    }

    pub fn view(&self, items: &[T]) -> SelectView {
        let filtered_total = self.filtered(items).len();

        let rows: Vec<SelectRow> = self
            .page_rows(items)
            .into_iter()
            .map(|(id, item)| {
                let record = Record::new(item);
                SelectRow {
                    cells: self
                        .config
                        .columns
                        .iter()
                        .map(|column| column.value.read(&record))
                        .collect(),
                    selected: self.is_selected(&id),
                    disabled: self.is_disabled(&id),
                    id,
                }
            })
            .collect();

        let mut selectable = rows.iter().filter(|row| !row.disabled).peekable();
        let all_on_page_selected =
            selectable.peek().is_some() && selectable.all(|row| row.selected);

        SelectView {
            headers: self.config.columns.iter().map(|c| c.title.clone()).collect(),
            search: self.search.clone(),
            page: self.current_page(filtered_total),
            page_count: self.page_count(filtered_total),
            page_size: self.page_size,
            page_size_options: self.config.page_size_options.clone(),
            filtered_total,
            selected_count: self.selected.len(),
            all_on_page_selected,
            multi_select: self.config.multi_select,
            rows,
        }
    }
}
