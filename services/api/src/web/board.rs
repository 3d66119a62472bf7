//! services/api/src/web/board.rs
//!
//! The in-memory mirror of the task and message boards.
//!
//! Every mutation is applied to the mirror and pushed to subscribers before the
//! store confirms it. When the store call fails, the mirror is rebuilt from the
//! store and a fresh snapshot is pushed, so the store's copy always wins.

use crate::web::protocol::BoardEvent;
use call_desk_core::domain::{Message, Task, TaskFilter, TaskPatch};
use call_desk_core::optimistic::OptimisticList;
use call_desk_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};
use uuid::Uuid;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Default)]
pub struct BoardMirror {
    pub tasks: OptimisticList<Task>,
    pub messages: OptimisticList<Message>,
    /// Ids removed locally since the last resync. A late create confirmation must not revive them.
    removed: HashSet<Uuid>,
}

impl BoardMirror {
    fn snapshot(&self) -> BoardEvent {
        BoardEvent::Snapshot {
            tasks: self.tasks.items().to_vec(),
            messages: self.messages.items().to_vec(),
        }
    }
}

pub struct BoardHub {
    mirror: Mutex<BoardMirror>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for BoardHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            mirror: Mutex::new(BoardMirror::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> BoardEvent {
        self.mirror.lock().await.snapshot()
    }

    /// Replaces the mirror with the store's lists and pushes a snapshot.
    pub async fn resync(&self, db: &dyn DatabaseService) -> PortResult<()> {
        let tasks = db.list_tasks(TaskFilter::All).await?;
        let messages = db.list_messages().await?;
        let snapshot = {
            let mut mirror = self.mirror.lock().await;
            mirror.tasks.replace_all(tasks);
            mirror.messages.replace_all(messages);
            mirror.removed.clear();
            mirror.snapshot()
        };
        self.publish(snapshot);
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Tasks
    //-------------------------------------------------------------------------------------

    pub async fn create_task(&self, db: &dyn DatabaseService, task: Task) -> PortResult<Task> {
        let local = task.clone();
        let created = self
            .mutate(
                db,
                move |mirror| {
                    mirror.tasks.upsert(local.clone());
                    vec![BoardEvent::TaskUpserted { task: local }]
                },
                db.create_task(&task),
            )
            .await?;
        self.confirm_created_task(created).await
    }

    pub async fn update_task(
        &self,
        db: &dyn DatabaseService,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> PortResult<Task> {
        let local = patch.clone();
        let updated = self
            .mutate(
                db,
                move |mirror| {
                    mirror
                        .tasks
                        .update(&task_id, |task| {
                            if let Some(text) = local.text {
                                task.text = text;
                            }
                            if let Some(category) = local.category {
                                task.category = category;
                            }
                        })
                        .map(|task| BoardEvent::TaskUpserted { task })
                        .into_iter()
                        .collect()
                },
                db.update_task(task_id, &patch),
            )
            .await?;
        self.confirm_task(updated).await
    }

    /// Completes the task (`Some`) or restores it to pending (`None`).
    pub async fn set_task_completed_at(
        &self,
        db: &dyn DatabaseService,
        task_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Task> {
        let updated = self
            .mutate(
                db,
                move |mirror| {
                    mirror
                        .tasks
                        .update(&task_id, |task| task.completed_at = completed_at)
                        .map(|task| BoardEvent::TaskUpserted { task })
                        .into_iter()
                        .collect()
                },
                db.set_task_completed_at(task_id, completed_at),
            )
            .await?;
        self.confirm_task(updated).await
    }

    pub async fn delete_task(&self, db: &dyn DatabaseService, task_id: Uuid) -> PortResult<()> {
        self.mutate_removal(
            db,
            move |mirror| {
                mirror.removed.insert(task_id);
                mirror
                    .tasks
                    .remove(&task_id)
                    .map(|_| BoardEvent::TaskRemoved { id: task_id })
                    .into_iter()
                    .collect()
            },
            db.delete_task(task_id),
        )
        .await
    }

    //-------------------------------------------------------------------------------------
    // Messages
    //-------------------------------------------------------------------------------------

    pub async fn post_message(
        &self,
        db: &dyn DatabaseService,
        message: Message,
    ) -> PortResult<Message> {
        let local = message.clone();
        let created = self
            .mutate(
                db,
                move |mirror| {
                    mirror.messages.upsert(local.clone());
                    vec![BoardEvent::MessageUpserted { message: local }]
                },
                db.create_message(&message),
            )
            .await?;
        self.confirm_created_message(created).await
    }

    pub async fn edit_message(
        &self,
        db: &dyn DatabaseService,
        message_id: Uuid,
        text: String,
    ) -> PortResult<Message> {
        let local = text.clone();
        let updated = self
            .mutate(
                db,
                move |mirror| {
                    mirror
                        .messages
                        .update(&message_id, |message| message.text = local)
                        .map(|message| BoardEvent::MessageUpserted { message })
                        .into_iter()
                        .collect()
                },
                db.update_message_text(message_id, &text),
            )
            .await?;
        self.confirm_message(updated).await
    }

    pub async fn delete_message(
        &self,
        db: &dyn DatabaseService,
        message_id: Uuid,
    ) -> PortResult<()> {
        self.mutate_removal(
            db,
            move |mirror| {
                mirror.removed.insert(message_id);
                mirror
                    .messages
                    .remove(&message_id)
                    .map(|_| BoardEvent::MessageRemoved { id: message_id })
                    .into_iter()
                    .collect()
            },
            db.delete_message(message_id),
        )
        .await
    }

    //-------------------------------------------------------------------------------------
    // Internals
    //-------------------------------------------------------------------------------------

    /// Applies `local` to the mirror, publishes its events, then awaits the store.
    async fn mutate<T, L, F>(&self, db: &dyn DatabaseService, local: L, remote: F) -> PortResult<T>
    where
        L: FnOnce(&mut BoardMirror) -> Vec<BoardEvent>,
        F: Future<Output = PortResult<T>>,
    {
        self.apply_local(local).await;
        match remote.await {
            Ok(value) => Ok(value),
            Err(e) => Err(self.reconcile(db, e).await),
        }
    }

    /// Like `mutate`, but a store that no longer has the row already agrees with the mirror.
    async fn mutate_removal<L, F>(&self, db: &dyn DatabaseService, local: L, remote: F) -> PortResult<()>
    where
        L: FnOnce(&mut BoardMirror) -> Vec<BoardEvent>,
        F: Future<Output = PortResult<()>>,
    {
        self.apply_local(local).await;
        match remote.await {
            Ok(()) => Ok(()),
            Err(e @ PortError::NotFound(_)) => Err(e),
            Err(e) => Err(self.reconcile(db, e).await),
        }
    }

    async fn apply_local<L>(&self, local: L)
    where
        L: FnOnce(&mut BoardMirror) -> Vec<BoardEvent>,
    {
        let events = {
            let mut mirror = self.mirror.lock().await;
            local(&mut mirror)
        };
        for event in events {
            self.publish(event);
        }
    }

    async fn reconcile(&self, db: &dyn DatabaseService, err: PortError) -> PortError {
        warn!("Store rejected a board change, reconciling: {:?}", err);
        if let Err(resync_err) = self.resync(db).await {
            error!("Failed to reload the board after a rejected change: {:?}", resync_err);
        }
        err
    }

    /// Replaces the optimistic copy with the row the store returned.
    ///
    /// Rows removed from the mirror while the store call was in flight stay removed.
    async fn confirm_task(&self, task: Task) -> PortResult<Task> {
        let confirmed = {
            let mut mirror = self.mirror.lock().await;
            mirror.tasks.update(&task.id, |row| *row = task.clone())
        };
        if let Some(task) = confirmed {
            self.publish(BoardEvent::TaskUpserted { task });
        }
        Ok(task)
    }

    /// Created rows are upserted, since a resync may have dropped the optimistic copy,
    /// unless the id was deleted in the meantime.
    async fn confirm_created_task(&self, task: Task) -> PortResult<Task> {
        let revived = {
            let mut mirror = self.mirror.lock().await;
            if mirror.removed.contains(&task.id) {
                false
            } else {
                mirror.tasks.upsert(task.clone());
                true
            }
        };
        if revived {
            self.publish(BoardEvent::TaskUpserted { task: task.clone() });
        }
        Ok(task)
    }

    async fn confirm_created_message(&self, message: Message) -> PortResult<Message> {
        let revived = {
            let mut mirror = self.mirror.lock().await;
            if mirror.removed.contains(&message.id) {
                false
            } else {
                mirror.messages.upsert(message.clone());
                true
            }
        };
        if revived {
            self.publish(BoardEvent::MessageUpserted {
                message: message.clone(),
            });
        }
        Ok(message)
    }

    async fn confirm_message(&self, message: Message) -> PortResult<Message> {
        let confirmed = {
            let mut mirror = self.mirror.lock().await;
            mirror.messages.update(&message.id, |row| *row = message.clone())
        };
        if let Some(message) = confirmed {
            self.publish(BoardEvent::MessageUpserted { message });
        }
        Ok(message)
    }

    fn publish(&self, event: BoardEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
