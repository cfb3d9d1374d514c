mod naver_geocoder;
mod pipeline;
