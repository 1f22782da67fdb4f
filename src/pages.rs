//! Admin listing pages and the router between them.

use crate::column::{ColumnDef, Visibility, is_blank};
use crate::domain::LVError;
use crate::list_view::ListViewProps;
use crate::record::{Record, TableRow};
use crate::toolbar::{Search, SearchInput, SearchOption, SelectAction, SelectFilter};
use crate::visibility::ViewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Courses,
    Modules,
    Assignments,
    Quizzes,
    Submissions,
}

use PageKind::*;

const ALL_PAGES: [PageKind; 5] = [Courses, Modules, Assignments, Quizzes, Submissions];

impl PageKind {
    pub fn path(&self) -> &'static str {
        match self {
            Courses => "/admin/courses",
            Modules => "/admin/modules",
            Assignments => "/admin/assignments",
            Quizzes => "/admin/quizzes",
            Submissions => "/admin/submissions",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Courses => "Courses",
            Modules => "Modules",
            Assignments => "Assignments",
            Quizzes => "Quizzes",
            Submissions => "Submissions",
        }
    }

    /// Data file backing the page, relative to the data directory.
    pub fn file(&self) -> &'static str {
        match self {
            Courses => "courses.csv",
            Modules => "modules.csv",
            Assignments => "assignments.csv",
            Quizzes => "quizzes.csv",
            Submissions => "submissions.csv",
        }
    }

    /// Pages whose rows carry a position the user can change.
    pub fn is_reorderable(&self) -> bool {
        matches!(self, Modules)
    }

    pub fn props(&self) -> ListViewProps<Record> {
        let view = ViewId::new(self.path());
        let copy = SelectAction::new('c', "Copy");
        let clear = SelectAction::new('u', "Clear");
        match self {
            Courses => ListViewProps::new(
                view,
                vec![
                    ColumnDef::field("id", "#").with_hideable(false).with_width(4),
                    ColumnDef::field("code", "Code").with_width(8),
                    ColumnDef::field("title", "Title").with_hideable(false),
                    ColumnDef::field("instructor", "Instructor"),
                    ColumnDef::field("status", "Status"),
                    ColumnDef::field("level", "Level"),
                    ColumnDef::field("students", "Students"),
                    ColumnDef::field("batch", "Batch").with_visibility(Visibility::WhenAnyValue),
                    ColumnDef::field("description", "Description")
                        .with_visibility(Visibility::Never)
                        .with_sortable(false),
                ],
            )
            .with_search(Search::Fields(vec!["title".into(), "code".into()]))
            .with_custom_filters(vec![
                Box::new(SelectFilter::new("Status", "status", &["draft", "published", "archived"])),
                Box::new(SelectFilter::new("Level", "level", &["beginner", "intermediate", "advanced"])),
            ])
            .with_select_actions(vec![copy, clear]),
            Modules => ListViewProps::new(
                view,
                vec![
                    ColumnDef::field("position", "Pos").with_hideable(false).with_width(4),
                    ColumnDef::field("title", "Title").with_hideable(false).with_sortable(false),
                    ColumnDef::field("course", "Course").with_sortable(false),
                    ColumnDef::field("lessons", "Lessons").with_sortable(false),
                    ColumnDef::field("duration", "Duration")
                        .with_visibility(Visibility::WhenAnyValue)
                        .with_sortable(false),
                ],
            )
            .with_search(Search::Field("title".into()))
            .with_custom_filters(vec![Box::new(SelectFilter::new(
                "Course",
                "course",
                &["RUST-101", "WEB-201", "DATA-110"],
            ))])
            .with_select_actions(vec![copy, clear]),
            Assignments => ListViewProps::new(
                view,
                vec![
                    ColumnDef::field("id", "#").with_hideable(false).with_width(4),
                    ColumnDef::field("title", "Title").with_hideable(false),
                    ColumnDef::field("course", "Course"),
                    ColumnDef::field("due_date", "Due").with_visibility(Visibility::WhenAnyValue),
                    ColumnDef::field("max_score", "Max"),
                    ColumnDef::field("submissions", "Submissions"),
                    ColumnDef::field("status", "Status"),
                ],
            )
            .with_search(Search::Labeled(vec![
                SearchOption::new("Title", "title", SearchInput::Text),
                SearchOption::new("Course", "course", SearchInput::Text),
                SearchOption::new("Max score", "max_score", SearchInput::Number),
            ]))
            .with_custom_filters(vec![Box::new(SelectFilter::new(
                "Status",
                "status",
                &["open", "closed"],
            ))])
            .with_select_actions(vec![copy, clear]),
            Quizzes => ListViewProps::new(
                view,
                vec![
                    ColumnDef::field("id", "#").with_hideable(false).with_width(4),
                    ColumnDef::field("title", "Title").with_hideable(false),
                    ColumnDef::field("course", "Course"),
                    ColumnDef::field("questions", "Questions"),
                    ColumnDef::computed("pass", "Pass mark", pass_mark),
                    ColumnDef::field("time_limit", "Time limit")
                        .with_visibility(Visibility::WhenAnyValue),
                    ColumnDef::field("status", "Status"),
                ],
            )
            .with_search(Search::Field("title".into()))
            .with_custom_filters(vec![Box::new(SelectFilter::new(
                "Status",
                "status",
                &["draft", "published"],
            ))])
            .with_select_actions(vec![copy, clear]),
            Submissions => ListViewProps::new(
                view,
                vec![
                    ColumnDef::field("id", "#").with_hideable(false).with_width(4),
                    ColumnDef::field("student", "Student").with_hideable(false),
                    ColumnDef::field("assignment", "Assignment"),
                    ColumnDef::field("submitted_at", "Submitted"),
                    ColumnDef::field("score", "Score"),
                    ColumnDef::field("status", "Status"),
                    ColumnDef::field("late", "Late").with_visibility(Visibility::PredicateOnRows(any_late)),
                    ColumnDef::field("feedback", "Feedback")
                        .with_visibility(Visibility::WhenAnyValue)
                        .with_sortable(false),
                ],
            )
            .with_search(Search::Fields(vec!["student".into(), "assignment".into()]))
            .with_custom_filters(vec![Box::new(SelectFilter::new(
                "Status",
                "status",
                &["pending", "graded"],
            ))])
            .with_select_actions(vec![copy, clear]),
        }
    }
}

fn pass_mark(row: &Record) -> String {
    match (row.field("passing_score"), row.field("questions")) {
        (Some(pass), Some(total)) if !is_blank(pass) => format!("{pass}/{total}"),
        _ => String::from("-"),
    }
}

fn any_late(rows: &[Record]) -> bool {
    rows.iter().any(|r| r.field("late") == Some("yes"))
}

/// Resolves navigation paths to pages.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    current: usize,
}

impl Router {
    pub fn new(path: &str) -> Result<Self, LVError> {
        let current = ALL_PAGES
            .iter()
            .position(|p| p.path() == path)
            .ok_or_else(|| LVError::UnknownView(path.to_string()))?;
        Ok(Router { current })
    }

    pub fn all_pages() -> &'static [PageKind] {
        &ALL_PAGES
    }

    pub fn current(&self) -> PageKind {
        ALL_PAGES[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn goto(&mut self, idx: usize) -> Option<PageKind> {
        if idx >= ALL_PAGES.len() || idx == self.current {
            return None;
        }
        self.current = idx;
        Some(self.current())
    }

    pub fn next(&mut self) -> PageKind {
        self.current = (self.current + 1) % ALL_PAGES.len();
        self.current()
    }

    pub fn prev(&mut self) -> PageKind {
        self.current = (self.current + ALL_PAGES.len() - 1) % ALL_PAGES.len();
        self.current()
    }
}
