use super::domain::Message;
use crate::accounts::builders::BuilderId;
use crate::accounts::users::UserId;
use crate::store::RepositoryError;

pub trait MessageRepository: Send + Sync {
    fn insert(&self, message: Message) -> Result<Message, RepositoryError>;
    fn between(&self, user: &UserId, builder: &BuilderId) -> Result<Vec<Message>, RepositoryError>;
    fn for_user(&self, user: &UserId) -> Result<Vec<Message>, RepositoryError>;
    fn for_builder(&self, builder: &BuilderId) -> Result<Vec<Message>, RepositoryError>;
}
