mod fusion_merge_props;
