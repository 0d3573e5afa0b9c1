use crate::agent::Message;
use crate::state::{HandlerFailure, RouteOutcome, RoutedMessage};

/// 一次 drain-and-process 的结果
#[derive(Clone, Debug, Default)]
pub struct DrainOutcome {
    pub processed: usize,
    pub responses: Vec<Message>,
    pub failures: Vec<HandlerFailure>,
}

/// 单次编排的路由历史与失败记录
#[derive(Default)]
pub(crate) struct RunLog {
    pub history: Vec<RoutedMessage>,
    pub failures: Vec<HandlerFailure>,
}

impl RunLog {
    pub fn record_route(&mut self, round: u32, message: Message, outcome: RouteOutcome) {
        self.history.push(RoutedMessage {
            round,
            message,
            outcome,
        });
    }
}
