pub mod shared {
    pub mod core {
        pub mod error_response;
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod event_store;
    }
}

pub mod modules {
    pub mod events {
        pub mod use_cases {
            pub mod ingest_event {
                pub mod command;
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_event {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod list_events {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
    }
    pub mod aggregates {
        pub mod core {
            pub mod fold;
            pub mod folds;
            pub mod read_model;
        }
        pub mod use_cases {
            pub mod project_events {
                pub mod projector;
                pub mod runner;
                pub mod status;
            }
            pub mod get_aggregate {
                pub mod inbound {
                    pub mod http;
                }
                pub mod queries_port;
            }
            pub mod admin {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod read_models;
                pub mod read_models_in_memory;
            }
        }
    }
}

pub mod shell;
