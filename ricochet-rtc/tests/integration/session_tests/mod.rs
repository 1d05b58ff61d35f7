mod test_coordinate_channel;
mod test_video_track;
