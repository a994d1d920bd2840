use crate::dns::dispatcher::Dispatcher;
use crate::engine::Origin;
use crate::error::Error;
use crate::upstream::Transport;
use tracing::error;
use trust_dns_proto::op::{Header, Message, ResponseCode};
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::server::{Protocol, Request, RequestHandler, ResponseHandler, ResponseInfo};

#[derive(Clone)]
pub struct Handler {
    dispatcher: Dispatcher,
}

impl Handler {
    pub(super) fn new(dispatcher: Dispatcher) -> Self {
        Handler { dispatcher }
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let origin = Origin {
            addr: request.src(),
            transport: transport(request.protocol()),
        };
        let query = query_message(request);
        let response = self.dispatcher.dispatch(&query, origin).await;
        self.send_message(request, response_handle, &response).await
    }

    async fn send_message<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        message: &Message,
    ) -> Result<ResponseInfo, Error> {
        let mut builder = MessageResponseBuilder::from_message_request(request);
        if let Some(edns) = message.extensions() {
            builder.edns(edns.clone());
        }
        let response = builder.build(
            *message.header(),
            message.answers(),
            message.name_servers(),
            &[],
            message.additionals(),
        );
        Ok(response_handle.send_response(response).await?)
    }
}

fn transport(protocol: Protocol) -> Transport {
    match protocol {
        Protocol::Udp => Transport::Udp,
        _ => Transport::Tcp,
    }
}

/// Rebuild the decoded request as a plain [`Message`] the engine can inspect and forward.
fn query_message(request: &Request) -> Message {
    let header = request.header();
    let mut message = Message::new();
    message
        .set_id(header.id())
        .set_message_type(header.message_type())
        .set_op_code(header.op_code())
        .set_recursion_desired(header.recursion_desired())
        .set_checking_disabled(header.checking_disabled())
        .set_authentic_data(header.authentic_data());
    message.add_query(request.query().original().clone());
    message.add_additionals(request.additionals().iter().cloned());
    if let Some(edns) = request.edns() {
        message.set_edns(edns.clone());
    }
    message
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
