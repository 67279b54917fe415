use askama::Template;
use tb_core::forms::{FormErrors, NewTopicForm, MESSAGE_MAX, SUBJECT_MAX};
use tb_core::models::{Board, TopicSummary};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub boards: &'a [Board],
}

#[derive(Template)]
#[template(path = "topics.html")]
pub struct TopicsTemplate<'a> {
    pub board: &'a Board,
    pub topics: &'a [TopicSummary],
}

#[derive(Template)]
#[template(path = "new_topic.html")]
pub struct NewTopicTemplate<'a> {
    pub board: &'a Board,
    pub form: &'a NewTopicForm,
    pub errors: &'a FormErrors,
    pub subject_max: usize,
    pub message_max: usize,
}

impl<'a> NewTopicTemplate<'a> {
    pub fn new(board: &'a Board, form: &'a NewTopicForm, errors: &'a FormErrors) -> Self {
        Self {
            board,
            form,
            errors,
            subject_max: SUBJECT_MAX,
            message_max: MESSAGE_MAX,
        }
    }
}

#[derive(Template)]
#[template(path = "input.html")]
pub struct InputTemplate;

#[derive(Template)]
#[template(path = "test.html")]
pub struct TestTemplate;
