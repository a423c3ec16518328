pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
}

pub mod expression {
    pub mod domain {
        pub mod emotion;
        pub mod expression_classifier;
        pub mod expression_detector;
        pub mod expression_distribution;
        pub mod face_detection;
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod overlay {
    pub mod domain {
        pub mod annotation;
        pub mod overlay_surface;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod cycle_logger;
    pub mod detect_still_use_case;
    pub mod display_board;
    pub mod error;
    pub mod live_detection_loop;
    pub mod model_loader;
}
