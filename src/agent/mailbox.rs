use std::collections::VecDeque;

use parking_lot::Mutex;

use super::message::Message;

/// 单个 Agent 的收件箱（FIFO，多生产者单消费者）
#[derive(Default)]
pub struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn enqueue(&self, message: Message) {
        self.queue.lock().push_back(message);
    }

    /// 取出全部待处理消息，收件箱随即清空
    pub fn drain(&self) -> Vec<Message> {
        std::mem::take(&mut *self.queue.lock()).into()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.queue.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Message> {
        self.queue.lock().back().cloned()
    }
}
