pub mod shared {
    pub mod core {
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod document_store;
        pub mod event_sink;
        pub mod identity;
    }
}

pub mod modules {
    pub mod offers {
        pub mod core {
            pub mod errors;
            pub mod event_message;
            pub mod offer;
            pub mod outbox_entry;
            pub mod patch;
        }
        pub mod use_cases {
            pub mod authorization_guard;
            pub mod offer_service;
            pub mod create_offer {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_offer {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod update_offer {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod delete_offer {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod relay_outbox {
                pub mod backoff;
                pub mod relay;
            }
        }
        pub mod adapters {
            pub mod inbound {
                pub mod error_response;
                pub mod request;
            }
            pub mod outbound {
                pub mod offer_repository;
                pub mod outbox_store;
                pub mod product_lookup;
            }
        }
    }
}

pub mod shell;
