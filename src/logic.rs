//! Presentation layer - turns assistant state into Telegram HTML

use crate::consts::{limits, Lecture};
use crate::ideas::Idea;
use crate::news::{Article, NewsState};
use crate::planner::{Task, Urgency};
use crate::utils::{escape_html, truncate_text};
use chrono::{DateTime, Local, Utc};

/// Build help message
pub fn build_help_message() -> &'static str {
    r#"🛡️ <b>مساعدي الشخصي</b>

<b>الأخبار:</b>
/news — 📰 آخر الأخبار التقنية (مترجمة)

<b>المهام:</b>
/task نص — مهمة عادية
/urgent نص — مهمة طارئة
/tasks — عرض المهام
/done رقم — حذف مهمة

<b>التدخين:</b>
/smoke — سجلت الآن (تذكير بعد ساعة)

<b>الجدول:</b>
/lectures — الجدول الدراسي
/remind رقم — تذكير بمحاضرة

<b>الأفكار:</b>
/idea نص — حفظ فكرة
/ideas — عرض الأفكار
/forget رقم — حذف فكرة

<i>Rust 🦀</i>"#
}

pub fn format_article(article: &Article) -> String {
    let title = truncate_text(&article.title, limits::MAX_TITLE_CHARS);
    let date = match article.published {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => article.pub_date.clone(),
    };

    let mut out = format!(
        "{} <i>{}</i>\n<b>{}</b>\n   └ <code>{}</code>",
        article.source_icon,
        escape_html(article.source_name),
        escape_html(&title),
        escape_html(&date),
    );
    if !article.link.is_empty() {
        out.push_str(&format!(" <a href=\"{}\">[Link]</a>", escape_html(&article.link)));
    }
    out.push('\n');
    out
}

pub fn format_news(state: &NewsState) -> String {
    let mut output = String::from("<b>المركز الإخباري التقني 🛡️</b>\n\n");
    if state.loading {
        output.push_str("⏳ تحديث آخر قيد التنفيذ...\n\n");
    }
    if state.articles.is_empty() {
        output.push_str("🕸 لا توجد أخبار الآن، أعد المحاولة بـ /news\n");
        return output;
    }
    for article in state.articles.iter() {
        output.push_str(&format_article(article));
        output.push('\n');
    }
    output.push_str(&build_summary(state));
    output
}

/// Build summary line
pub fn build_summary(state: &NewsState) -> String {
    let translated = state.articles.iter().take(limits::TRANSLATE_PREFIX).filter(|a| !a.is_arabic()).count();
    format!(
        "───────────────────\n📰 {} articles | 🌐 up to {} translated",
        state.articles.len(),
        translated
    )
}

pub fn format_tasks(tasks: &[Task], last_smoke: Option<DateTime<Utc>>) -> String {
    let mut output = String::from("<b>📌 المهام الحالية</b>\n");
    if tasks.is_empty() {
        output.push_str("\nلا توجد مهام.\n");
    }
    for task in tasks {
        let marker = match task.urgency {
            Urgency::Urgent => "🔴",
            Urgency::Normal => "🟢",
        };
        output.push_str(&format!(
            "\n{} ({}) {}\n   └ <code>/done {}</code>",
            marker,
            task.urgency,
            escape_html(&task.text),
            task.id
        ));
    }

    let smoke = match last_smoke {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M").to_string(),
        None => "لم تسجل".to_string(),
    };
    output.push_str(&format!("\n\n🚭 آخر مرة: {}\n", smoke));
    output
}

pub fn format_lectures(lectures: &[Lecture], pending_reminders: usize) -> String {
    let mut output = String::from("<b>🎓 الجدول الدراسي</b>\n");
    for (i, lecture) in lectures.iter().enumerate() {
        output.push_str(&format!(
            "\n{}. {} — {} <code>{}</code>",
            i + 1,
            lecture.day,
            escape_html(lecture.subject),
            lecture.time
        ));
    }
    output.push_str(&format!("\n\n🔔 /remind رقم — تذكيرات معلقة: {}\n", pending_reminders));
    output
}

pub fn format_ideas(ideas: &[Idea]) -> String {
    let mut output = String::from("<b>مخزن الأفكار 💡</b>\n");
    if ideas.is_empty() {
        output.push_str("\nلا توجد أفكار بعد.\n");
    }
    for idea in ideas {
        output.push_str(&format!(
            "\n💡 {}\n   └ <code>/forget {}</code>",
            escape_html(&idea.text),
            idea.id
        ));
    }
    output.push('\n');
    output
}
