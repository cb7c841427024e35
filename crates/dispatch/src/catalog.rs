//! Static menu content: labels, their replies, and the keyboard layout.

use shared::domain::{Label, ReplyPayload};
use storage::CounterSchema;

pub const NEWS: &str = "📢 Новости";
pub const CONSULTATIONS: &str = "🗓️ Расписание консультаций";
pub const HISTORY: &str = "📚 История кафедры";
pub const APPLICANTS: &str = "🎓 Абитуриентам";
pub const STUDENTS: &str = "👨‍🎓 Студентам";
pub const SPORTS: &str = "⚽ Спортивная работа";
pub const GTO_CENTER: &str = "🏅 Центр тестирования ГТО";
pub const STAFF: &str = "👨‍🏫 Сотрудники кафедры";

/// Name the history item carried before it was renamed.
pub const LEGACY_HISTORY: &str = "📚 История";

pub const WELCOME_TEXT: &str = "Вы находитесь на официальном канале кафедры теории и методики массовой физкультурно-оздоровительной работы НГУ им. П.Ф. Лесгафта, Санкт-Петербург";

pub const NEWS_TEXT: &str =
    "📢 Новости кафедры - здесь будут размещаться актуальные новости и события кафедры.";

pub const CONSULTATION_SCHEDULE_TEXT: &str = "
🗓️ Расписание консультаций

Понедельник: 10:00 - 12:00
Вторник: 14:00 - 16:00  
Среда: 10:00 - 12:00
Четверг: 14:00 - 16:00
Пятница: 10:00 - 12:00
";

pub const HISTORY_PARTS: [&str; 5] = [
    "📚 История кафедры - часть 1...",
    "📚 История кафедры - часть 2...",
    "📚 История кафедры - часть 3...",
    "📚 История кафедры - часть 4...",
    "📚 История кафедры - часть 5...",
];
pub const HISTORY_CLOSING_TEXT: &str = "История кафедры завершена.";

pub const APPLICANTS_TEXT: &str = "🎓 Абитуриентам - информация для поступающих...";
pub const STUDENTS_TEXT: &str = "👨‍🎓 Студентам - учебные материалы и расписание...";
pub const SPORTS_WORK_TEXT: &str = "⚽ Спортивная работа - мероприятия и соревнования...";
pub const GTO_TESTING_CENTER_TEXT: &str =
    "🏅 Центр тестирования ГТО - подготовка к сдаче нормативов...";
pub const GTO_TESTING_CENTER_TEXT_PART2: &str =
    "🏅 Центр тестирования ГТО - контакты и преимущества...";
pub const STAFF_TEXT: &str = "👨‍🏫 Сотрудники кафедры - список преподавателей...";

pub const FALLBACK_TEXT: &str = "Пожалуйста, используйте кнопки меню для навигации.";
pub const RESET_DONE_TEXT: &str = "✅ Статистика сброшена!";

#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub label: Label,
    /// Sent in order; the last one normally carries the keyboard.
    pub replies: Vec<ReplyPayload>,
}

impl MenuEntry {
    fn single(label: &str, text: &str) -> Self {
        Self {
            label: Label::from(label),
            replies: vec![ReplyPayload::rich(text).with_keyboard()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<MenuEntry>,
    keyboard: Vec<Vec<Label>>,
    renames: Vec<(String, Label)>,
    fallback: ReplyPayload,
    welcome: ReplyPayload,
}

impl Catalog {
    pub fn new(
        entries: Vec<MenuEntry>,
        keyboard: Vec<Vec<Label>>,
        fallback: ReplyPayload,
        welcome: ReplyPayload,
    ) -> Self {
        Self {
            entries,
            keyboard,
            renames: Vec::new(),
            fallback,
            welcome,
        }
    }

    pub fn with_rename(mut self, legacy: impl Into<String>, current: Label) -> Self {
        self.renames.push((legacy.into(), current));
        self
    }

    /// The department menu.
    pub fn department() -> Self {
        let mut history: Vec<ReplyPayload> = HISTORY_PARTS
            .iter()
            .map(|part| ReplyPayload::rich(*part))
            .collect();
        history.push(ReplyPayload::plain(HISTORY_CLOSING_TEXT).with_keyboard());

        let entries = vec![
            MenuEntry::single(NEWS, NEWS_TEXT),
            MenuEntry::single(CONSULTATIONS, CONSULTATION_SCHEDULE_TEXT),
            MenuEntry {
                label: Label::from(HISTORY),
                replies: history,
            },
            MenuEntry::single(APPLICANTS, APPLICANTS_TEXT),
            MenuEntry::single(STUDENTS, STUDENTS_TEXT),
            MenuEntry::single(SPORTS, SPORTS_WORK_TEXT),
            MenuEntry {
                label: Label::from(GTO_CENTER),
                replies: vec![
                    ReplyPayload::rich(GTO_TESTING_CENTER_TEXT),
                    ReplyPayload::rich(GTO_TESTING_CENTER_TEXT_PART2).with_keyboard(),
                ],
            },
            MenuEntry::single(STAFF, STAFF_TEXT),
        ];

        let keyboard = [
            [NEWS, CONSULTATIONS],
            [HISTORY, APPLICANTS],
            [STUDENTS, SPORTS],
            [GTO_CENTER, STAFF],
        ]
        .iter()
        .map(|row| row.iter().copied().map(Label::from).collect())
        .collect();

        Self::new(
            entries,
            keyboard,
            ReplyPayload::plain(FALLBACK_TEXT).with_keyboard(),
            ReplyPayload::rich(WELCOME_TEXT).with_keyboard(),
        )
        .with_rename(LEGACY_HISTORY, Label::from(HISTORY))
    }

    pub fn lookup(&self, text: &str) -> Option<&MenuEntry> {
        self.entries
            .iter()
            .find(|entry| entry.label.as_str() == text)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.entries.iter().map(|entry| &entry.label)
    }

    pub fn keyboard(&self) -> &[Vec<Label>] {
        &self.keyboard
    }

    pub fn fallback(&self) -> &ReplyPayload {
        &self.fallback
    }

    pub fn welcome(&self) -> &ReplyPayload {
        &self.welcome
    }

    /// Counter layout matching this catalog, including legacy renames.
    pub fn counter_schema(&self) -> CounterSchema {
        self.renames.iter().fold(
            CounterSchema::new(self.labels().cloned()),
            |schema, (legacy, current)| schema.with_rename(legacy.clone(), current.clone()),
        )
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
