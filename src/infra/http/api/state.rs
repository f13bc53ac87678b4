use std::sync::Arc;

use crate::application::activities::ActivityService;
use crate::application::todos::TodoService;

#[derive(Clone)]
pub struct ApiState {
    pub activities: Arc<ActivityService>,
    pub todos: Arc<TodoService>,
}

impl ApiState {
    pub fn new(activities: ActivityService, todos: TodoService) -> Self {
        Self {
            activities: Arc::new(activities),
            todos: Arc::new(todos),
        }
    }
}
