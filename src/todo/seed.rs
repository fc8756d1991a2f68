use super::model::{Priority, Todo};

const SEED_USERNAME: &str = "Soslan";
const SEED_EMAIL: &str = "SP@yandex.ru";

/// Records the store starts with when seeding is enabled
pub fn seed_todos() -> Vec<Todo> {
    [
        (1, "Sports", "Go to the gym", Priority::Medium),
        (2, "Read", "Read 30 minutes", Priority::Medium),
        (3, "History", "Edit document", Priority::Low),
        (4, "Eat", "Eat with appetite and between 2000 and 2500 ccal", Priority::Medium),
        (5, "Programming", "Practise programming", Priority::High),
    ]
    .into_iter()
    .map(|(todo_id, name, description, priority)| Todo {
        todo_id,
        todo_name: name.to_string(),
        todo_description: description.to_string(),
        priority,
        username: SEED_USERNAME.to_string(),
        user_email: Some(SEED_EMAIL.to_string()),
    })
    .collect()
}
